//! Shared proptest strategies for pact model types.
//!
//! Strategies are version aware: they only produce documents that can be
//! written at the requested specification version, so serialization
//! round-trips hold for every generated value.

use pact_models::{
    Generator, GeneratorCategory, Generators, MatchingRule, MatchingRuleDefinition, MatchingRules,
    Message, MessagePact, OptionalBody, Pact, PactSpecVersion, Participant, ProviderState,
    QueryParams, Request, RequestResponseInteraction, RequestResponsePact, Response, RuleList,
    RuleLogic,
};
use proptest::prelude::*;
use serde_json::Value;

/// Generate participant names.
pub fn participant_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{2,20}"
}

/// Generate HTTP methods.
pub fn http_method_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("GET".to_string()),
        Just("POST".to_string()),
        Just("PUT".to_string()),
        Just("PATCH".to_string()),
        Just("DELETE".to_string()),
    ]
}

/// Generate HTTP status codes.
pub fn http_status_code_strategy() -> impl Strategy<Value = u16> {
    prop_oneof![
        Just(200u16),
        Just(201u16),
        Just(204u16),
        Just(400u16),
        Just(404u16),
        Just(409u16),
        Just(500u16),
        Just(503u16),
    ]
}

/// Generate request paths.
pub fn path_strategy() -> impl Strategy<Value = String> {
    "(/[a-z0-9]{1,8}){1,3}"
}

/// Generate header names that carry no special parsing rules.
pub fn header_name_strategy() -> impl Strategy<Value = String> {
    "X-[A-Z][a-z]{2,8}"
}

/// Generate header values without separators.
pub fn header_value_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9/.]{1,12}"
}

/// Generate multi-valued header maps.
pub fn headers_strategy() -> impl Strategy<Value = pact_models::Headers> {
    prop::collection::btree_map(
        header_name_strategy(),
        prop::collection::vec(header_value_strategy(), 1..3),
        0..3,
    )
    .prop_map(|map| map.into_iter().collect())
}

/// Generate multi-valued query parameters.
pub fn query_strategy() -> impl Strategy<Value = QueryParams> {
    prop::collection::btree_map(
        "[a-z]{1,6}",
        prop::collection::vec("[a-z0-9 ]{1,8}", 1..3),
        0..3,
    )
    .prop_map(|map| map.into_iter().collect())
}

/// Generate scalar JSON values.
pub fn json_leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
    ]
}

/// Generate arbitrary nested JSON values.
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    json_leaf_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Generate JSON objects with at least one field.
pub fn json_object_strategy() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z]{1,8}", json_value_strategy(), 1..5)
        .prop_map(|map| Value::Object(map.into_iter().collect()))
}

/// Generate bodies: missing, JSON or plain text.
pub fn body_strategy() -> impl Strategy<Value = OptionalBody> {
    prop_oneof![
        Just(OptionalBody::Missing),
        json_object_strategy().prop_map(|value| OptionalBody::from_json(&value)),
        "[a-z][a-z ]{0,19}".prop_map(OptionalBody::from_text),
    ]
}

/// Generate provider states; V1/V2 documents cannot carry parameters.
pub fn provider_state_strategy(version: PactSpecVersion) -> BoxedStrategy<ProviderState> {
    let name = "[a-z][a-z ]{2,20}";
    if version < PactSpecVersion::V3 {
        name.prop_map(ProviderState::new).boxed()
    } else {
        (
            name,
            prop::collection::btree_map("[a-z]{1,6}", json_leaf_strategy(), 0..3),
        )
            .prop_map(|(name, params)| ProviderState::with_params(name, params))
            .boxed()
    }
}

/// Generate the provider states of one interaction.
pub fn provider_states_strategy(version: PactSpecVersion) -> BoxedStrategy<Vec<ProviderState>> {
    let max = if version < PactSpecVersion::V3 { 2 } else { 3 };
    prop::collection::vec(provider_state_strategy(version), 0..max).boxed()
}

/// Generate matching rules valid at the version.
pub fn matching_rule_strategy(version: PactSpecVersion) -> BoxedStrategy<MatchingRule> {
    let common = prop_oneof![
        Just(MatchingRule::Equality),
        Just(MatchingRule::Type),
        (0usize..5).prop_map(MatchingRule::MinType),
        (1usize..10).prop_map(MatchingRule::MaxType),
        (0usize..3, 3usize..6).prop_map(|(min, max)| MatchingRule::MinMaxType(min, max)),
        prop_oneof![Just("\\d+"), Just("[a-z]+"), Just("^\\w+@\\w+$")]
            .prop_map(|re| MatchingRule::Regex(re.to_string())),
        "[a-z]{1,5}".prop_map(MatchingRule::Include),
        Just(MatchingRule::Integer),
        Just(MatchingRule::Decimal),
        Just(MatchingRule::Number),
        Just(MatchingRule::Boolean),
        Just(MatchingRule::Null),
        Just(MatchingRule::Date("yyyy-MM-dd".to_string())),
        Just(MatchingRule::Timestamp(String::new())),
    ];
    if version >= PactSpecVersion::V4 {
        prop_oneof![
            4 => common,
            1 => Just(MatchingRule::NotEmpty),
            1 => Just(MatchingRule::Semver),
            1 => Just(MatchingRule::EachValue(MatchingRuleDefinition::new(vec![MatchingRule::Type]))),
        ]
        .boxed()
    } else {
        common.boxed()
    }
}

fn rule_list_strategy(version: PactSpecVersion) -> BoxedStrategy<RuleList> {
    if version < PactSpecVersion::V3 {
        matching_rule_strategy(version).prop_map(RuleList::new).boxed()
    } else {
        (
            prop::collection::vec(matching_rule_strategy(version), 1..3),
            prop_oneof![Just(RuleLogic::And), Just(RuleLogic::Or)],
        )
            .prop_map(|(rules, logic)| {
                let mut list = RuleList::empty(logic);
                for rule in rules {
                    list.add_rule(rule);
                }
                list
            })
            .boxed()
    }
}

/// Generate body path expressions.
pub fn body_path_strategy() -> impl Strategy<Value = String> {
    "\\$\\.[a-z]{1,6}(\\[\\*\\]|\\[[0-9]\\])?(\\.[a-z]{1,6})?"
}

/// Generate matching rules for the body and header categories.
pub fn matching_rules_strategy(version: PactSpecVersion) -> BoxedStrategy<MatchingRules> {
    (
        prop::collection::btree_map(body_path_strategy(), rule_list_strategy(version), 0..3),
        prop::collection::btree_map(header_name_strategy(), rule_list_strategy(version), 0..2),
    )
        .prop_map(|(body, headers)| {
            let mut rules = MatchingRules::new();
            if !body.is_empty() {
                rules.add_category("body").rules.extend(body);
            }
            if !headers.is_empty() {
                rules.add_category("header").rules.extend(headers);
            }
            rules
        })
        .boxed()
}

/// Generate generators valid at the version; none before V3.
pub fn generators_strategy(version: PactSpecVersion) -> BoxedStrategy<Generators> {
    if version < PactSpecVersion::V3 {
        return Just(Generators::new()).boxed();
    }
    let generator = prop_oneof![
        (0i64..10, 10i64..100).prop_map(|(min, max)| Generator::RandomInt(min, max)),
        (1usize..20).prop_map(Generator::RandomString),
        Just(Generator::Uuid),
        Just(Generator::Date(None)),
        "[a-z]{1,6}".prop_map(|key| Generator::ProviderState(format!("${{{key}}}"), None)),
    ];
    prop::collection::btree_map(body_path_strategy(), generator, 0..3)
        .prop_map(|body| {
            let mut generators = Generators::new();
            for (path, generator) in body {
                generators.add_generator(GeneratorCategory::Body, path, generator);
            }
            generators
        })
        .boxed()
}

/// Generate requests.
pub fn request_strategy(version: PactSpecVersion) -> BoxedStrategy<Request> {
    (
        http_method_strategy(),
        path_strategy(),
        query_strategy(),
        headers_strategy(),
        body_strategy(),
        matching_rules_strategy(version),
        generators_strategy(version),
    )
        .prop_map(|(method, path, query, headers, body, matching_rules, generators)| Request {
            method,
            path,
            query,
            headers,
            body,
            matching_rules,
            generators,
        })
        .boxed()
}

/// Generate responses.
pub fn response_strategy(version: PactSpecVersion) -> BoxedStrategy<Response> {
    (
        http_status_code_strategy(),
        headers_strategy(),
        body_strategy(),
        matching_rules_strategy(version),
        generators_strategy(version),
    )
        .prop_map(|(status, headers, body, matching_rules, generators)| Response {
            status,
            headers,
            body,
            matching_rules,
            generators,
        })
        .boxed()
}

/// Generate HTTP interactions.
pub fn interaction_strategy(version: PactSpecVersion) -> BoxedStrategy<RequestResponseInteraction> {
    (
        "[a-z][a-z ]{2,20}",
        provider_states_strategy(version),
        request_strategy(version),
        response_strategy(version),
    )
        .prop_map(|(description, provider_states, request, response)| RequestResponseInteraction {
            interaction_id: None,
            description,
            provider_states,
            request,
            response,
        })
        .boxed()
}

/// Generate HTTP pacts; duplicate interaction keys are dropped on creation.
pub fn pact_strategy(version: PactSpecVersion) -> BoxedStrategy<Pact> {
    (
        participant_name_strategy(),
        participant_name_strategy(),
        prop::collection::vec(interaction_strategy(version), 0..5),
    )
        .prop_map(|(consumer, provider, interactions)| {
            Pact::from(RequestResponsePact::new(
                Participant::new(consumer),
                Participant::new(provider),
                interactions,
            ))
        })
        .boxed()
}

/// Generate messages (V3 and later).
pub fn message_strategy(version: PactSpecVersion) -> BoxedStrategy<Message> {
    (
        "[a-z][a-z ]{2,20}",
        provider_states_strategy(version),
        json_object_strategy(),
        prop::collection::btree_map("[a-z]{1,6}", "[a-z0-9]{1,8}".prop_map(Value::String), 0..3),
        matching_rules_strategy(version),
    )
        .prop_map(|(description, provider_states, contents, metadata, matching_rules)| Message {
            interaction_id: None,
            description,
            provider_states,
            contents: OptionalBody::from_json(&contents),
            metadata,
            matching_rules,
            generators: Generators::new(),
        })
        .boxed()
}

/// Generate message pacts (V3 and later).
pub fn message_pact_strategy(version: PactSpecVersion) -> BoxedStrategy<Pact> {
    (
        participant_name_strategy(),
        participant_name_strategy(),
        prop::collection::vec(message_strategy(version), 0..4),
    )
        .prop_map(|(consumer, provider, messages)| {
            Pact::from(MessagePact::new(
                Participant::new(consumer),
                Participant::new(provider),
                messages,
            ))
        })
        .boxed()
}

//! Property-based tests for the matching engine.
//!
//! Tests validate:
//! - Matching a request, response or message against itself finds nothing
//! - Type rules ignore value changes but not type changes
//! - A violated regex rule yields exactly one mismatch at its path
//! - Matching is reentrant across threads

use pact_matching::{MatchingConfig, Mismatch, match_body, match_message, match_request, match_response};
use pact_models::matchingrules::BODY;
use pact_models::{ContentType, MatchingRule, MatchingRules, OptionalBody, PactSpecVersion};
use proptest::prelude::*;
use serde_json::{Value, json};
use test_utils::{
    json_object_strategy, message_strategy, request_strategy, response_strategy,
};

fn body_rules(path: &str, rule: MatchingRule) -> MatchingRules {
    let mut rules = MatchingRules::new();
    rules.add_category(BODY).add_rule(path, rule);
    rules
}

fn match_json_bodies(expected: &Value, actual: &Value, rules: &MatchingRules) -> Vec<Mismatch> {
    let ct = ContentType::json();
    match_body(
        &OptionalBody::from_json(expected),
        &ct,
        &OptionalBody::from_json(actual),
        &ct,
        rules,
        &MatchingConfig::new(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_request_matches_itself(mut request in request_strategy(PactSpecVersion::V3)) {
        request.matching_rules = MatchingRules::new();
        let mismatches = match_request(&request, &request, &MatchingConfig::new());
        prop_assert!(mismatches.is_empty(), "{:?}", mismatches);
    }

    #[test]
    fn prop_response_matches_itself(mut response in response_strategy(PactSpecVersion::V3)) {
        response.matching_rules = MatchingRules::new();
        let mismatches = match_response(&response, &response, &MatchingConfig::new());
        prop_assert!(mismatches.is_empty(), "{:?}", mismatches);
    }

    #[test]
    fn prop_message_matches_itself(mut message in message_strategy(PactSpecVersion::V3)) {
        message.matching_rules = MatchingRules::new();
        let mismatches = match_message(&message, &message, &MatchingConfig::new());
        prop_assert!(mismatches.is_empty(), "{:?}", mismatches);
    }

    #[test]
    fn prop_json_body_matches_itself(body in json_object_strategy()) {
        prop_assert!(match_json_bodies(&body, &body, &MatchingRules::new()).is_empty());
    }

    #[test]
    fn prop_extra_actual_keys_are_allowed(
        body in json_object_strategy(),
        extra in "[A-Z]{1,8}",
        value in any::<i32>(),
    ) {
        let mut actual = body.clone();
        if let Value::Object(map) = &mut actual {
            map.insert(extra, json!(value));
        }
        prop_assert!(match_json_bodies(&body, &actual, &MatchingRules::new()).is_empty());
    }

    #[test]
    fn prop_type_rule_ignores_value_changes(
        expected_id in any::<i64>(),
        actual_id in any::<i64>(),
        name in "[a-z]{1,8}",
    ) {
        let rules = body_rules("$.id", MatchingRule::Type);
        let expected = json!({"id": expected_id, "name": name});
        let actual = json!({"id": actual_id, "name": name});
        prop_assert!(match_json_bodies(&expected, &actual, &rules).is_empty());
    }

    #[test]
    fn prop_type_rule_rejects_type_changes(
        expected_id in any::<i64>(),
        actual_id in "[a-z]{1,8}",
    ) {
        let rules = body_rules("$.id", MatchingRule::Type);
        let mismatches = match_json_bodies(&json!({"id": expected_id}), &json!({"id": actual_id}), &rules);
        prop_assert_eq!(mismatches.len(), 1);
        prop_assert_eq!(mismatches[0].location(), "$.id");
    }

    #[test]
    fn prop_regex_violation_is_one_mismatch(
        conforming in "[A-Z]{3}-[0-9]{2}",
        violating in "[a-z]{1,6}",
    ) {
        let rules = body_rules("$.code", MatchingRule::Regex("[A-Z]{3}-[0-9]{2}".to_string()));
        let expected = json!({"code": "ABC-12"});

        let conforming_actual = json!({"code": conforming});
        prop_assert!(match_json_bodies(&expected, &conforming_actual, &rules).is_empty());

        let mismatches = match_json_bodies(&expected, &json!({"code": violating}), &rules);
        prop_assert_eq!(mismatches.len(), 1);
        prop_assert_eq!(mismatches[0].location(), "$.code");
    }

    #[test]
    fn prop_wildcard_type_rule_applies_per_element(
        ids in prop::collection::vec(any::<i32>(), 1..6),
        changed in any::<prop::sample::Index>(),
    ) {
        let rules = body_rules("$.items[*].id", MatchingRule::Type);
        let expected = json!({"items": ids.iter().map(|id| json!({"id": id})).collect::<Vec<_>>()});

        let shifted: Vec<Value> = ids.iter().map(|id| json!({"id": i64::from(*id) + 1})).collect();
        let shifted_actual = json!({"items": shifted});
        prop_assert!(match_json_bodies(&expected, &shifted_actual, &rules).is_empty());

        let index = changed.index(ids.len());
        let mut retyped: Vec<Value> = ids.iter().map(|id| json!({"id": id})).collect();
        retyped[index] = json!({"id": "not a number"});
        let mismatches = match_json_bodies(&expected, &json!({"items": retyped}), &rules);
        prop_assert_eq!(mismatches.len(), 1);
        prop_assert_eq!(mismatches[0].location(), format!("$.items[{index}].id"));
    }
}

#[test]
fn test_type_rule_example() {
    let rules = body_rules("$.id", MatchingRule::Type);
    let expected = json!({"id": 1, "name": "x"});
    assert!(match_json_bodies(&expected, &json!({"id": 999, "name": "x"}), &rules).is_empty());

    let mismatches = match_json_bodies(&expected, &json!({"id": "abc", "name": "x"}), &rules);
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].location(), "$.id");
}

#[test]
fn test_every_offending_element_is_reported() {
    let rules = body_rules("$.items[*].id", MatchingRule::Type);
    let expected = json!({"items": [{"id": 1}, {"id": 2}]});
    let mismatches = match_json_bodies(&expected, &json!({"items": [{"id": "1"}, {"id": "2"}]}), &rules);
    let locations: Vec<String> = mismatches.iter().map(Mismatch::location).collect();
    assert_eq!(locations, vec!["$.items[0].id", "$.items[1].id"]);
}

#[test]
fn test_matching_is_reentrant_across_threads() {
    let rules = body_rules("$.items", MatchingRule::MinType(1));
    let expected = json!({"items": [{"sku": "A-1", "qty": 1}]});
    let actual = json!({"items": [{"sku": "B-2", "qty": 3}, {"sku": 7, "qty": 1}]});
    let baseline = match_json_bodies(&expected, &actual, &rules);
    assert_eq!(baseline.len(), 1);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| match_json_bodies(&expected, &actual, &rules)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), baseline);
        }
    });
}

//! Pact documents: the contract between a consumer and a provider.

use crate::interaction::{Interaction, RequestResponseInteraction, unique_key};
use crate::message::Message;
use crate::provider_state::ProviderState;
use crate::spec_version::PactSpecVersion;
use pact_common::{PactError, PactResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Metadata key identifying the library that wrote a document.
const TOOL_METADATA_KEY: &str = "pact-rust";

/// A participant in a contract (consumer or provider).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Participant {
    /// Participant name
    pub name: String,
}

impl Participant {
    /// Create a new participant.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn from_json(json: &Value, field: &str) -> PactResult<Self> {
        json.get(field)
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .map(Self::new)
            .ok_or_else(|| PactError::invalid_pact(format!("Pact document has no {field} name")))
    }
}

/// The party that wrote the pact.
pub type Consumer = Participant;

/// The party the pact is verified against.
pub type Provider = Participant;

/// Where a pact document was loaded from. Provenance only; never part of
/// pact equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PactSource {
    /// Local file
    File(PathBuf),
    /// Plain URL
    Url(String),
    /// Pact broker
    Broker {
        /// Broker base URL
        url: String,
        /// Consumer name the pact was published by
        consumer: String,
        /// Provider the pact was fetched for
        provider: String,
        /// Consumer version tags
        tags: Vec<String>,
        /// Whether the pact is pending for the provider
        pending: bool,
        /// Whether the pact is work in progress
        wip: bool,
    },
    /// Built in memory
    #[default]
    Unknown,
}

impl fmt::Display for PactSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file {}", path.display()),
            Self::Url(url) => write!(f, "URL {url}"),
            Self::Broker { url, consumer, .. } => write!(f, "broker {url} (consumer {consumer})"),
            Self::Unknown => f.write_str("unknown source"),
        }
    }
}

fn metadata_json(extra: &BTreeMap<String, Value>, version: PactSpecVersion) -> Value {
    let mut map: Map<String, Value> = extra
        .iter()
        .filter(|(key, _)| {
            !matches!(
                key.as_str(),
                "pactSpecification" | "pact-specification" | "pactSpecificationVersion" | TOOL_METADATA_KEY
            )
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    map.insert(
        version.metadata_key().to_string(),
        json!({"version": version.version_str()}),
    );
    map.insert(
        TOOL_METADATA_KEY.to_string(),
        json!({"version": env!("CARGO_PKG_VERSION")}),
    );
    Value::Object(map)
}

fn metadata_from_json(json: &Value) -> BTreeMap<String, Value> {
    json.get("metadata")
        .and_then(Value::as_object)
        .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

/// Keep the first interaction per key, warning about the dropped ones.
fn dedup_by_key<T>(items: Vec<T>, key: impl Fn(&T) -> String) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let k = key(item);
            let first = seen.insert(k.clone());
            if !first {
                warn!(key = %k, "dropping duplicate interaction");
            }
            first
        })
        .collect()
}

fn sort_key(states: &[ProviderState], description: &str) -> (String, String) {
    let names = states.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(", ");
    (names, description.to_string())
}

/// A pact of HTTP interactions.
#[derive(Debug, Clone, Default)]
pub struct RequestResponsePact {
    /// Consumer
    pub consumer: Consumer,
    /// Provider
    pub provider: Provider,
    /// Interactions, deduplicated by unique key
    pub interactions: Vec<RequestResponseInteraction>,
    /// Document metadata other than the specification version
    pub metadata: BTreeMap<String, Value>,
    /// Version the document was read with
    pub spec_version: PactSpecVersion,
    /// Where the document came from
    pub source: PactSource,
}

impl PartialEq for RequestResponsePact {
    fn eq(&self, other: &Self) -> bool {
        self.consumer == other.consumer
            && self.provider == other.provider
            && self.interactions == other.interactions
    }
}

impl Eq for RequestResponsePact {}

impl RequestResponsePact {
    /// Create a pact; interactions with duplicate keys are dropped.
    #[must_use]
    pub fn new(consumer: Consumer, provider: Provider, interactions: Vec<RequestResponseInteraction>) -> Self {
        Self {
            consumer,
            provider,
            interactions: dedup_by_key(interactions, |i| unique_key(&i.provider_states, &i.description)),
            ..Self::default()
        }
    }

    /// Sort interactions by provider state names, then description.
    pub fn sort_interactions(&mut self) {
        self.interactions
            .sort_by_cached_key(|i| sort_key(&i.provider_states, &i.description));
    }
}

/// A pact of asynchronous messages.
#[derive(Debug, Clone, Default)]
pub struct MessagePact {
    /// Consumer
    pub consumer: Consumer,
    /// Provider
    pub provider: Provider,
    /// Messages, deduplicated by unique key
    pub messages: Vec<Message>,
    /// Document metadata other than the specification version
    pub metadata: BTreeMap<String, Value>,
    /// Version the document was read with
    pub spec_version: PactSpecVersion,
    /// Where the document came from
    pub source: PactSource,
}

impl PartialEq for MessagePact {
    fn eq(&self, other: &Self) -> bool {
        self.consumer == other.consumer && self.provider == other.provider && self.messages == other.messages
    }
}

impl Eq for MessagePact {}

impl MessagePact {
    /// Create a pact; messages with duplicate keys are dropped.
    #[must_use]
    pub fn new(consumer: Consumer, provider: Provider, messages: Vec<Message>) -> Self {
        Self {
            consumer,
            provider,
            messages: dedup_by_key(messages, |m| unique_key(&m.provider_states, &m.description)),
            ..Self::default()
        }
    }

    /// Sort messages by provider state names, then description.
    pub fn sort_interactions(&mut self) {
        self.messages
            .sort_by_cached_key(|m| sort_key(&m.provider_states, &m.description));
    }
}

/// A pact of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pact {
    /// HTTP interactions
    RequestResponse(RequestResponsePact),
    /// Message interactions
    Message(MessagePact),
}

impl Pact {
    /// Consumer of the pact.
    #[must_use]
    pub const fn consumer(&self) -> &Consumer {
        match self {
            Self::RequestResponse(p) => &p.consumer,
            Self::Message(p) => &p.consumer,
        }
    }

    /// Provider of the pact.
    #[must_use]
    pub const fn provider(&self) -> &Provider {
        match self {
            Self::RequestResponse(p) => &p.provider,
            Self::Message(p) => &p.provider,
        }
    }

    /// Version the document was read with.
    #[must_use]
    pub const fn spec_version(&self) -> PactSpecVersion {
        match self {
            Self::RequestResponse(p) => p.spec_version,
            Self::Message(p) => p.spec_version,
        }
    }

    /// Where the document came from.
    #[must_use]
    pub const fn source(&self) -> &PactSource {
        match self {
            Self::RequestResponse(p) => &p.source,
            Self::Message(p) => &p.source,
        }
    }

    /// Attach provenance.
    #[must_use]
    pub fn with_source(mut self, source: PactSource) -> Self {
        match &mut self {
            Self::RequestResponse(p) => p.source = source,
            Self::Message(p) => p.source = source,
        }
        self
    }

    /// Whether this is a message pact.
    #[must_use]
    pub const fn is_message_pact(&self) -> bool {
        matches!(self, Self::Message(_))
    }

    /// Interactions in document order.
    #[must_use]
    pub fn interactions(&self) -> Vec<Interaction> {
        match self {
            Self::RequestResponse(p) => p.interactions.iter().cloned().map(Interaction::from).collect(),
            Self::Message(p) => p.messages.iter().cloned().map(Interaction::from).collect(),
        }
    }

    /// Number of interactions.
    #[must_use]
    pub fn interaction_count(&self) -> usize {
        match self {
            Self::RequestResponse(p) => p.interactions.len(),
            Self::Message(p) => p.messages.len(),
        }
    }

    /// Sort interactions by provider state names, then description.
    pub fn sort_interactions(&mut self) {
        match self {
            Self::RequestResponse(p) => p.sort_interactions(),
            Self::Message(p) => p.sort_interactions(),
        }
    }

    /// Problems with writing this pact at the given version.
    #[must_use]
    pub fn validate_for_version(&self, version: PactSpecVersion) -> Vec<String> {
        let mut errors: Vec<String> = self
            .interactions()
            .iter()
            .flat_map(|i| i.validate_for_version(version))
            .collect();
        if self.is_message_pact() && version < PactSpecVersion::V3 {
            errors.insert(0, format!("Message pacts cannot be written as version {version}"));
            errors.dedup();
        }
        errors
    }

    /// Parse a pact document.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::InvalidPact`] for malformed documents and
    /// [`PactError::UnsupportedMatcher`] for unknown matchers or generators.
    pub fn from_json(json: &Value) -> PactResult<Self> {
        if !json.is_object() {
            return Err(PactError::invalid_pact("Pact document must be a JSON object"));
        }
        let consumer = Participant::from_json(json, "consumer")?;
        let provider = Participant::from_json(json, "provider")?;
        let metadata = metadata_from_json(json);
        let version = PactSpecVersion::from_metadata(json.get("metadata"));
        debug!(consumer = %consumer.name, provider = %provider.name, %version, "parsing pact");

        let pact = if version >= PactSpecVersion::V4 {
            Self::from_v4_interactions(json, consumer, provider)?
        } else if let Some(messages) = json.get("messages") {
            let messages = array_of(messages, "messages")?
                .iter()
                .map(|m| Message::from_json(m, version))
                .collect::<PactResult<Vec<_>>>()?;
            Self::Message(MessagePact::new(consumer, provider, messages))
        } else {
            let interactions = match json.get("interactions") {
                Some(value) => array_of(value, "interactions")?
                    .iter()
                    .map(|i| RequestResponseInteraction::from_json(i, version))
                    .collect::<PactResult<Vec<_>>>()?,
                None => Vec::new(),
            };
            Self::RequestResponse(RequestResponsePact::new(consumer, provider, interactions))
        };

        Ok(pact.with_metadata(metadata, version))
    }

    /// Parse a pact document from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::InvalidPact`] when the bytes are not a pact document.
    pub fn from_slice(bytes: &[u8]) -> PactResult<Self> {
        let json: Value = serde_json::from_slice(bytes)
            .map_err(|err| PactError::invalid_pact(format!("Pact document is not valid JSON: {err}")))?;
        Self::from_json(&json)
    }

    fn from_v4_interactions(json: &Value, consumer: Consumer, provider: Provider) -> PactResult<Self> {
        let interactions = match json.get("interactions") {
            Some(value) => array_of(value, "interactions")?
                .iter()
                .map(Interaction::from_v4_json)
                .collect::<PactResult<Vec<_>>>()?,
            None => Vec::new(),
        };

        let (messages, http): (Vec<_>, Vec<_>) = interactions.into_iter().partition(Interaction::is_message);
        match (http.is_empty(), messages.is_empty()) {
            (false, false) => Err(PactError::invalid_pact(
                "V4 pact mixes HTTP and message interactions",
            )),
            (true, false) => Ok(Self::Message(MessagePact::new(
                consumer,
                provider,
                messages
                    .into_iter()
                    .filter_map(|i| match i {
                        Interaction::Message(m) => Some(m),
                        Interaction::RequestResponse(_) => None,
                    })
                    .collect(),
            ))),
            _ => Ok(Self::RequestResponse(RequestResponsePact::new(
                consumer,
                provider,
                http.into_iter()
                    .filter_map(|i| match i {
                        Interaction::RequestResponse(rr) => Some(rr),
                        Interaction::Message(_) => None,
                    })
                    .collect(),
            ))),
        }
    }

    fn with_metadata(mut self, metadata: BTreeMap<String, Value>, version: PactSpecVersion) -> Self {
        match &mut self {
            Self::RequestResponse(p) => {
                p.metadata = metadata;
                p.spec_version = version;
            }
            Self::Message(p) => {
                p.metadata = metadata;
                p.spec_version = version;
            }
        }
        self
    }

    /// Render the pact as a document of the given version.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::InvalidPact`] when a rule, generator or the pact
    /// kind is not supported by the version; nothing is silently downgraded.
    pub fn to_json(&self, version: PactSpecVersion) -> PactResult<Value> {
        let errors = self.validate_for_version(version);
        if !errors.is_empty() {
            return Err(PactError::invalid_pact(errors.join("; ")));
        }

        let mut map = Map::new();
        map.insert("consumer".to_string(), json!({"name": self.consumer().name}));
        map.insert("provider".to_string(), json!({"name": self.provider().name}));

        let rendered: Vec<Value> = self.interactions().iter().map(|i| i.to_json(version)).collect();
        let key = if self.is_message_pact() && version < PactSpecVersion::V4 {
            "messages"
        } else {
            "interactions"
        };
        map.insert(key.to_string(), Value::Array(rendered));

        let metadata = match self {
            Self::RequestResponse(p) => &p.metadata,
            Self::Message(p) => &p.metadata,
        };
        map.insert("metadata".to_string(), metadata_json(metadata, version));
        Ok(Value::Object(map))
    }

    /// Merge two pacts for the same consumer and provider.
    ///
    /// Interactions are unioned by unique key, keeping ours on duplicates,
    /// and sorted by provider state names then description.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::InvalidPact`] when the participants or the pact
    /// kinds differ.
    pub fn merge(&self, other: &Self) -> PactResult<Self> {
        if self.consumer() != other.consumer() || self.provider() != other.provider() {
            return Err(PactError::invalid_pact(format!(
                "Cannot merge pacts for different participants: {}/{} and {}/{}",
                self.consumer().name,
                self.provider().name,
                other.consumer().name,
                other.provider().name
            )));
        }

        let ours = self.interactions();
        for theirs in other.interactions() {
            if let Some(conflict) = ours.iter().find(|i| i.conflicts_with(&theirs)) {
                warn!(key = %conflict.unique_key(), "merged pacts disagree on an interaction, keeping the existing one");
            }
        }

        let mut merged = match (self, other) {
            (Self::RequestResponse(a), Self::RequestResponse(b)) => {
                let mut interactions = a.interactions.clone();
                interactions.extend(b.interactions.iter().cloned());
                let mut pact = RequestResponsePact::new(a.consumer.clone(), a.provider.clone(), interactions);
                pact.metadata.clone_from(&a.metadata);
                pact.spec_version = a.spec_version.max(b.spec_version);
                pact.source = a.source.clone();
                Self::RequestResponse(pact)
            }
            (Self::Message(a), Self::Message(b)) => {
                let mut messages = a.messages.clone();
                messages.extend(b.messages.iter().cloned());
                let mut pact = MessagePact::new(a.consumer.clone(), a.provider.clone(), messages);
                pact.metadata.clone_from(&a.metadata);
                pact.spec_version = a.spec_version.max(b.spec_version);
                pact.source = a.source.clone();
                Self::Message(pact)
            }
            _ => {
                return Err(PactError::invalid_pact(
                    "Cannot merge a message pact with an HTTP pact",
                ));
            }
        };
        merged.sort_interactions();
        Ok(merged)
    }
}

impl From<RequestResponsePact> for Pact {
    fn from(pact: RequestResponsePact) -> Self {
        Self::RequestResponse(pact)
    }
}

impl From<MessagePact> for Pact {
    fn from(pact: MessagePact) -> Self {
        Self::Message(pact)
    }
}

fn array_of<'a>(value: &'a Value, field: &str) -> PactResult<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| PactError::invalid_pact(format!("'{field}' must be an array")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::OptionalBody;
    use crate::generators::{Generator, GeneratorCategory};
    use crate::matchingrules::{BODY, MatchingRule, RuleLogic};
    use crate::request::Request;
    use crate::response::Response;

    fn http_pact(descriptions: &[&str]) -> Pact {
        Pact::from(RequestResponsePact::new(
            Participant::new("web"),
            Participant::new("orders"),
            descriptions
                .iter()
                .map(|d| RequestResponseInteraction::new(*d, Request::new("GET", "/orders"), Response::new(200)))
                .collect(),
        ))
    }

    #[test]
    fn test_participant_serialization() {
        let participant = Participant::new("token-service");
        let json = serde_json::to_string(&participant).unwrap();
        assert_eq!(json, r#"{"name":"token-service"}"#);
    }

    #[test]
    fn test_missing_consumer_is_invalid() {
        let err = Pact::from_json(&json!({"provider": {"name": "p"}})).unwrap_err();
        assert!(matches!(err, PactError::InvalidPact(_)));
        assert!(Pact::from_slice(b"not json").is_err());
    }

    #[test]
    fn test_version_defaults_to_v2() {
        let pact = Pact::from_json(&json!({
            "consumer": {"name": "c"},
            "provider": {"name": "p"},
            "interactions": []
        }))
        .unwrap();
        assert_eq!(pact.spec_version(), PactSpecVersion::V2);
    }

    #[test]
    fn test_metadata_written_per_version() {
        let pact = http_pact(&["a"]);
        let v2 = pact.to_json(PactSpecVersion::V2).unwrap();
        assert_eq!(v2["metadata"]["pact-specification"]["version"], json!("2.0.0"));
        let v3 = pact.to_json(PactSpecVersion::V3).unwrap();
        assert_eq!(v3["metadata"]["pactSpecification"]["version"], json!("3.0.0"));
        assert!(v3["metadata"]["pact-rust"]["version"].is_string());
    }

    #[test]
    fn test_round_trip_ignores_metadata_and_source() {
        let pact = http_pact(&["a", "b"]);
        for version in [PactSpecVersion::V2, PactSpecVersion::V3, PactSpecVersion::V4] {
            let json = pact.to_json(version).unwrap();
            let parsed = Pact::from_json(&json).unwrap().with_source(PactSource::Url("http://x".into()));
            assert_eq!(parsed, pact);
            assert_eq!(parsed.spec_version(), version);
        }
    }

    #[test]
    fn test_parsing_deduplicates() {
        let pact = Pact::from_json(&json!({
            "consumer": {"name": "c"},
            "provider": {"name": "p"},
            "interactions": [
                {"description": "a", "request": {"method": "GET", "path": "/1"}, "response": {"status": 200}},
                {"description": "a", "request": {"method": "GET", "path": "/2"}, "response": {"status": 200}}
            ]
        }))
        .unwrap();
        assert_eq!(pact.interaction_count(), 1);
        match &pact {
            Pact::RequestResponse(p) => assert_eq!(p.interactions[0].request.path, "/1"),
            Pact::Message(_) => panic!("expected an HTTP pact"),
        }
    }

    #[test]
    fn test_merge_dedups_and_sorts() {
        let a = http_pact(&["b", "a"]);
        let b = http_pact(&["c", "a"]);
        let merged = a.merge(&b).unwrap();
        let descriptions: Vec<_> = merged.interactions().iter().map(|i| i.description().to_string()).collect();
        assert_eq!(descriptions, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_merge_rejects_mismatched_pacts() {
        let http = http_pact(&["a"]);
        let other_consumer = Pact::from(RequestResponsePact::new(
            Participant::new("mobile"),
            Participant::new("orders"),
            Vec::new(),
        ));
        assert!(http.merge(&other_consumer).is_err());

        let messages = Pact::from(MessagePact::new(Participant::new("web"), Participant::new("orders"), Vec::new()));
        assert!(matches!(http.merge(&messages), Err(PactError::InvalidPact(_))));
    }

    #[test]
    fn test_message_pact_versions() {
        let pact = Pact::from(MessagePact::new(
            Participant::new("web"),
            Participant::new("orders"),
            vec![
                Message::new("order created")
                    .with_provider_state(ProviderState::new("an order"))
                    .with_contents(OptionalBody::from_json(&json!({"id": 1}))),
            ],
        ));
        assert!(matches!(pact.to_json(PactSpecVersion::V2), Err(PactError::InvalidPact(_))));

        let v3 = pact.to_json(PactSpecVersion::V3).unwrap();
        assert!(v3["messages"].is_array());
        assert_eq!(Pact::from_json(&v3).unwrap(), pact);

        let v4 = pact.to_json(PactSpecVersion::V4).unwrap();
        assert_eq!(v4["interactions"][0]["type"], json!("Asynchronous/Messages"));
        assert!(Pact::from_json(&v4).unwrap().is_message_pact());
    }

    #[test]
    fn test_v4_rule_blocks_lower_version() {
        let mut interaction = RequestResponseInteraction::new("a", Request::new("GET", "/"), Response::new(200));
        interaction
            .response
            .matching_rules
            .add_category(BODY)
            .add_rule("$.tags", MatchingRule::Semver);
        let pact = Pact::from(RequestResponsePact::new(
            Participant::new("c"),
            Participant::new("p"),
            vec![interaction],
        ));
        assert!(matches!(pact.to_json(PactSpecVersion::V3), Err(PactError::InvalidPact(_))));
        assert!(pact.to_json(PactSpecVersion::V4).is_ok());
    }

    fn single_interaction_pact(interaction: RequestResponseInteraction) -> Pact {
        Pact::from(RequestResponsePact::new(
            Participant::new("web"),
            Participant::new("orders"),
            vec![interaction],
        ))
    }

    #[test]
    fn test_generators_block_v2() {
        let mut interaction =
            RequestResponseInteraction::new("a", Request::new("GET", "/orders/1"), Response::new(200));
        interaction
            .request
            .generators
            .add_generator(GeneratorCategory::Path, "", Generator::RandomInt(1, 9));
        let pact = single_interaction_pact(interaction);

        assert_eq!(pact.validate_for_version(PactSpecVersion::V2).len(), 1);
        assert!(matches!(pact.to_json(PactSpecVersion::V2), Err(PactError::InvalidPact(_))));

        let v3 = pact.to_json(PactSpecVersion::V3).unwrap();
        assert_eq!(Pact::from_json(&v3).unwrap(), pact);
    }

    #[test]
    fn test_multi_rule_and_or_lists_block_v2() {
        let mut interaction = RequestResponseInteraction::new("a", Request::new("GET", "/"), Response::new(200));
        let body = interaction.response.matching_rules.add_category(BODY);
        body.add_rule("$.id", MatchingRule::Type);
        body.add_rule("$.id", MatchingRule::Regex("\\d+".to_string()));
        let pact = single_interaction_pact(interaction);
        assert!(matches!(pact.to_json(PactSpecVersion::V2), Err(PactError::InvalidPact(_))));
        assert_eq!(Pact::from_json(&pact.to_json(PactSpecVersion::V3).unwrap()).unwrap(), pact);

        let mut interaction = RequestResponseInteraction::new("b", Request::new("GET", "/"), Response::new(200));
        interaction
            .response
            .matching_rules
            .add_category(BODY)
            .add_rule_with_logic("$.status", MatchingRule::Type, RuleLogic::Or);
        let pact = single_interaction_pact(interaction);
        assert!(matches!(pact.to_json(PactSpecVersion::V2), Err(PactError::InvalidPact(_))));
        assert!(pact.to_json(PactSpecVersion::V3).is_ok());
    }

    #[test]
    fn test_single_and_rule_is_written_at_v2() {
        let mut interaction = RequestResponseInteraction::new("a", Request::new("GET", "/"), Response::new(200));
        interaction
            .response
            .matching_rules
            .add_category(BODY)
            .add_rule("$.id", MatchingRule::Type);
        let pact = single_interaction_pact(interaction);
        let v2 = pact.to_json(PactSpecVersion::V2).unwrap();
        assert_eq!(v2["interactions"][0]["response"]["matchingRules"]["$.body.id"], json!({"match": "type"}));
        assert_eq!(Pact::from_json(&v2).unwrap(), pact);
    }

    #[test]
    fn test_v4_mixed_kinds_rejected() {
        let json = json!({
            "consumer": {"name": "c"},
            "provider": {"name": "p"},
            "interactions": [
                {"type": "Synchronous/HTTP", "description": "a", "request": {"method": "GET", "path": "/"}, "response": {"status": 200}},
                {"type": "Asynchronous/Messages", "description": "b", "contents": "x"}
            ],
            "metadata": {"pactSpecification": {"version": "4.0"}}
        });
        assert!(matches!(Pact::from_json(&json), Err(PactError::InvalidPact(_))));
    }
}

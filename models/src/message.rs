//! Asynchronous message interactions.

use crate::body::OptionalBody;
use crate::content_type::{ContentType, detect_content_type};
use crate::generators::Generators;
use crate::headers::json_to_string;
use crate::http_part::{generators_from_json, matching_rules_from_json};
use crate::matchingrules::MatchingRules;
use crate::provider_state::ProviderState;
use crate::spec_version::PactSpecVersion;
use pact_common::PactResult;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Metadata keys that may carry the content type of a message.
const CONTENT_TYPE_KEYS: &[&str] = &["contentType", "content-type", "Content-Type"];

/// An asynchronous message payload expected by a consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Identifier assigned by a broker
    pub interaction_id: Option<String>,
    /// Description of the message
    pub description: String,
    /// Provider states
    pub provider_states: Vec<ProviderState>,
    /// Payload
    pub contents: OptionalBody,
    /// Metadata sent with the payload
    pub metadata: BTreeMap<String, Value>,
    /// Matching rules (`body` and `metadata` categories)
    pub matching_rules: MatchingRules,
    /// Generators
    pub generators: Generators,
}

impl Message {
    /// Create a message with a description.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Add a provider state.
    #[must_use]
    pub fn with_provider_state(mut self, state: ProviderState) -> Self {
        self.provider_states.push(state);
        self
    }

    /// Set the payload.
    #[must_use]
    pub fn with_contents(mut self, contents: OptionalBody) -> Self {
        self.contents = contents;
        self
    }

    /// Add a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Set the matching rules.
    #[must_use]
    pub fn with_matching_rules(mut self, rules: MatchingRules) -> Self {
        self.matching_rules = rules;
        self
    }

    /// Set the generators.
    #[must_use]
    pub fn with_generators(mut self, generators: Generators) -> Self {
        self.generators = generators;
        self
    }

    fn metadata_content_type(&self) -> Option<ContentType> {
        CONTENT_TYPE_KEYS
            .iter()
            .find_map(|key| self.metadata.get(*key))
            .map(|value| ContentType::parse(&json_to_string(value)))
            .filter(|ct| !ct.is_unknown())
    }

    /// Content type of the payload: the metadata entry wins over the content
    /// type the payload was declared with; otherwise it is sniffed.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        if let Some(ct) = self.metadata_content_type() {
            return ct;
        }
        match &self.contents {
            OptionalBody::Present(_, ct) if !ct.is_unknown() => ct.clone(),
            OptionalBody::Present(bytes, _) if !bytes.is_empty() => detect_content_type(bytes),
            _ => ContentType::unknown(),
        }
    }

    /// Parse a message from a pact document.
    ///
    /// # Errors
    ///
    /// Returns an error when the matching rules or generators are invalid.
    pub fn from_json(json: &Value, version: PactSpecVersion) -> PactResult<Self> {
        let metadata: BTreeMap<String, Value> = json
            .get("metadata")
            .or_else(|| json.get("metaData"))
            .and_then(Value::as_object)
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        let mut message = Self {
            interaction_id: json.get("_id").and_then(Value::as_str).map(str::to_string),
            description: json
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            provider_states: ProviderState::list_from_json(json),
            contents: OptionalBody::Missing,
            metadata,
            matching_rules: matching_rules_from_json(json)?,
            generators: generators_from_json(json)?,
        };
        message.contents =
            OptionalBody::from_pact_json(json.get("contents"), message.metadata_content_type(), version);
        Ok(message)
    }

    /// Render the message for a pact document.
    #[must_use]
    pub fn to_json(&self, version: PactSpecVersion) -> Value {
        let mut map = Map::new();
        if let Some(id) = &self.interaction_id {
            map.insert("_id".to_string(), json!(id));
        }
        map.insert("description".to_string(), json!(self.description));
        if !self.provider_states.is_empty() {
            map.insert(
                "providerStates".to_string(),
                Value::Array(self.provider_states.iter().map(ProviderState::to_json).collect()),
            );
        }
        if let Some(contents) = self.contents.to_json(&self.content_type(), version) {
            map.insert("contents".to_string(), contents);
        }
        if !self.metadata.is_empty() {
            let key = if version >= PactSpecVersion::V4 { "metadata" } else { "metaData" };
            map.insert(
                key.to_string(),
                Value::Object(self.metadata.clone().into_iter().collect()),
            );
        }
        if !self.matching_rules.is_empty() {
            map.insert("matchingRules".to_string(), self.matching_rules.to_json(version));
        }
        if let Some(generators) = self.generators.to_json(version) {
            map.insert("generators".to_string(), generators);
        }
        Value::Object(map)
    }
}

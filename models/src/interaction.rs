//! Interactions: the unit of expectation inside a pact.

use crate::message::Message;
use crate::provider_state::ProviderState;
use crate::request::Request;
use crate::response::Response;
use crate::spec_version::PactSpecVersion;
use pact_common::{PactError, PactResult};
use serde_json::{Map, Value, json};

/// V4 `type` tag of HTTP interactions.
pub const V4_HTTP_TYPE: &str = "Synchronous/HTTP";
/// V4 `type` tag of message interactions.
pub const V4_MESSAGE_TYPE: &str = "Asynchronous/Messages";

/// An HTTP request and the response the consumer expects for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestResponseInteraction {
    /// Identifier assigned by a broker
    pub interaction_id: Option<String>,
    /// Description of the interaction
    pub description: String,
    /// Provider states
    pub provider_states: Vec<ProviderState>,
    /// Expected request
    pub request: Request,
    /// Expected response
    pub response: Response,
}

impl RequestResponseInteraction {
    /// Create an interaction.
    #[must_use]
    pub fn new(description: impl Into<String>, request: Request, response: Response) -> Self {
        Self {
            description: description.into(),
            request,
            response,
            ..Self::default()
        }
    }

    /// Add a provider state.
    #[must_use]
    pub fn with_provider_state(mut self, state: ProviderState) -> Self {
        self.provider_states.push(state);
        self
    }

    /// Parse an interaction from a pact document.
    ///
    /// # Errors
    ///
    /// Returns an error when the request or response is invalid.
    pub fn from_json(json: &Value, version: PactSpecVersion) -> PactResult<Self> {
        let empty = Value::Object(Map::new());
        Ok(Self {
            interaction_id: json.get("_id").and_then(Value::as_str).map(str::to_string),
            description: json
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            provider_states: ProviderState::list_from_json(json),
            request: Request::from_json(json.get("request").unwrap_or(&empty), version)?,
            response: Response::from_json(json.get("response").unwrap_or(&empty), version)?,
        })
    }

    /// Render the interaction for a pact document.
    #[must_use]
    pub fn to_json(&self, version: PactSpecVersion) -> Value {
        let mut map = Map::new();
        if let Some(id) = &self.interaction_id {
            map.insert("_id".to_string(), json!(id));
        }
        map.insert("description".to_string(), json!(self.description));
        if version >= PactSpecVersion::V3 {
            if !self.provider_states.is_empty() {
                map.insert(
                    "providerStates".to_string(),
                    Value::Array(self.provider_states.iter().map(ProviderState::to_json).collect()),
                );
            }
        } else if let Some(state) = self.provider_states.first() {
            map.insert("providerState".to_string(), json!(state.name));
        }
        map.insert("request".to_string(), self.request.to_json(version));
        map.insert("response".to_string(), self.response.to_json(version));
        Value::Object(map)
    }
}

/// An interaction of either kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// HTTP request/response pair
    RequestResponse(RequestResponseInteraction),
    /// Asynchronous message
    Message(Message),
}

impl Interaction {
    /// Description of the interaction.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::RequestResponse(i) => &i.description,
            Self::Message(m) => &m.description,
        }
    }

    /// Provider states of the interaction.
    #[must_use]
    pub fn provider_states(&self) -> &[ProviderState] {
        match self {
            Self::RequestResponse(i) => &i.provider_states,
            Self::Message(m) => &m.provider_states,
        }
    }

    /// Identifier assigned by a broker.
    #[must_use]
    pub fn interaction_id(&self) -> Option<&str> {
        match self {
            Self::RequestResponse(i) => i.interaction_id.as_deref(),
            Self::Message(m) => m.interaction_id.as_deref(),
        }
    }

    /// Whether this is a message interaction.
    #[must_use]
    pub const fn is_message(&self) -> bool {
        matches!(self, Self::Message(_))
    }

    /// Provider state names joined for display, or `None`.
    #[must_use]
    pub fn display_state(&self) -> String {
        display_state(self.provider_states())
    }

    /// Key identifying the interaction within a pact.
    #[must_use]
    pub fn unique_key(&self) -> String {
        unique_key(self.provider_states(), self.description())
    }

    /// Whether two interactions with the same key cannot coexist in a pact:
    /// they are of different kinds or describe different exchanges.
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        if self.unique_key() != other.unique_key() {
            return false;
        }
        match (self, other) {
            (Self::RequestResponse(a), Self::RequestResponse(b)) => {
                a.request != b.request || a.response != b.response
            }
            (Self::Message(a), Self::Message(b)) => a.contents != b.contents || a.metadata != b.metadata,
            _ => true,
        }
    }

    /// Problems with using this interaction in a document of the given version.
    #[must_use]
    pub fn validate_for_version(&self, version: PactSpecVersion) -> Vec<String> {
        let describe = |errors: Vec<String>| -> Vec<String> {
            errors
                .into_iter()
                .map(|err| format!("'{}': {err}", self.description()))
                .collect()
        };
        match self {
            Self::RequestResponse(i) => {
                let mut errors = i.request.matching_rules.validate_for_version(version);
                errors.extend(i.request.generators.validate_for_version(version));
                errors.extend(i.response.matching_rules.validate_for_version(version));
                errors.extend(i.response.generators.validate_for_version(version));
                if version < PactSpecVersion::V3 {
                    if i.provider_states.len() > 1 {
                        errors.push("more than one provider state requires Pact specification version >= V3".to_string());
                    }
                    if i.provider_states.iter().any(|state| !state.params.is_empty()) {
                        errors.push("provider state parameters require Pact specification version >= V3".to_string());
                    }
                }
                describe(errors)
            }
            Self::Message(m) => {
                let mut errors = m.matching_rules.validate_for_version(version);
                errors.extend(m.generators.validate_for_version(version));
                if version < PactSpecVersion::V3 {
                    errors.push("message interactions require Pact specification version >= V3".to_string());
                }
                describe(errors)
            }
        }
    }

    /// Render the interaction; V4 documents carry a `type` tag.
    #[must_use]
    pub fn to_json(&self, version: PactSpecVersion) -> Value {
        let (mut json, type_tag) = match self {
            Self::RequestResponse(i) => (i.to_json(version), V4_HTTP_TYPE),
            Self::Message(m) => (m.to_json(version), V4_MESSAGE_TYPE),
        };
        if version >= PactSpecVersion::V4 {
            if let Value::Object(map) = &mut json {
                map.insert("type".to_string(), json!(type_tag));
            }
        }
        json
    }

    /// Parse a V4 interaction from its `type` tag.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::InvalidPact`] for unsupported interaction types.
    pub fn from_v4_json(json: &Value) -> PactResult<Self> {
        match json.get("type").and_then(Value::as_str) {
            Some(V4_HTTP_TYPE) | None => Ok(Self::RequestResponse(RequestResponseInteraction::from_json(
                json,
                PactSpecVersion::V4,
            )?)),
            Some(V4_MESSAGE_TYPE) => Ok(Self::Message(Message::from_json(json, PactSpecVersion::V4)?)),
            Some(other) => Err(PactError::invalid_pact(format!("Unsupported V4 interaction type '{other}'"))),
        }
    }
}

impl From<RequestResponseInteraction> for Interaction {
    fn from(interaction: RequestResponseInteraction) -> Self {
        Self::RequestResponse(interaction)
    }
}

impl From<Message> for Interaction {
    fn from(message: Message) -> Self {
        Self::Message(message)
    }
}

/// Provider state names joined with `, `, or `None` without states.
#[must_use]
pub fn display_state(states: &[ProviderState]) -> String {
    if states.is_empty() {
        "None".to_string()
    } else {
        states.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(", ")
    }
}

/// Deduplication key built from provider state names and the description.
#[must_use]
pub fn unique_key(states: &[ProviderState], description: &str) -> String {
    format!("{}_{description}", display_state(states))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction(description: &str, state: Option<&str>) -> RequestResponseInteraction {
        let mut i = RequestResponseInteraction::new(description, Request::new("GET", "/"), Response::new(200));
        if let Some(state) = state {
            i = i.with_provider_state(ProviderState::new(state));
        }
        i
    }

    #[test]
    fn test_unique_key() {
        let a = Interaction::from(interaction("get order", Some("order exists")));
        assert_eq!(a.unique_key(), "order exists_get order");
        let b = Interaction::from(interaction("get order", None));
        assert_eq!(b.unique_key(), "None_get order");
    }

    #[test]
    fn test_conflicts() {
        let a = Interaction::from(interaction("get order", None));
        let same = a.clone();
        assert!(!a.conflicts_with(&same));

        let mut changed = interaction("get order", None);
        changed.response.status = 404;
        assert!(a.conflicts_with(&Interaction::from(changed)));

        let message = Interaction::from(Message::new("get order"));
        assert!(a.conflicts_with(&message));
        assert!(!a.conflicts_with(&Interaction::from(interaction("other", None))));
    }

    #[test]
    fn test_provider_state_forms() {
        let i = interaction("get order", Some("order exists"));
        assert_eq!(i.to_json(PactSpecVersion::V2)["providerState"], json!("order exists"));
        assert_eq!(
            i.to_json(PactSpecVersion::V3)["providerStates"],
            json!([{"name": "order exists"}])
        );
    }

    #[test]
    fn test_v2_holds_one_state_without_params() {
        let mut i = interaction("get order", Some("order exists"));
        assert!(Interaction::from(i.clone()).validate_for_version(PactSpecVersion::V2).is_empty());

        i.provider_states.push(ProviderState::new("customer exists"));
        assert_eq!(Interaction::from(i.clone()).validate_for_version(PactSpecVersion::V2).len(), 1);

        let with_params = interaction("get order", None).with_provider_state(
            ProviderState::with_params("order exists", [("orderId".to_string(), json!(10))].into()),
        );
        let errors = Interaction::from(with_params).validate_for_version(PactSpecVersion::V2);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("parameters"));
        assert!(Interaction::from(i).validate_for_version(PactSpecVersion::V3).is_empty());
    }

    #[test]
    fn test_v4_type_tags() {
        let http = Interaction::from(interaction("a", None));
        let json = http.to_json(PactSpecVersion::V4);
        assert_eq!(json["type"], json!(V4_HTTP_TYPE));
        assert_eq!(Interaction::from_v4_json(&json).unwrap(), http);

        let message = Interaction::from(Message::new("b"));
        let json = message.to_json(PactSpecVersion::V4);
        assert_eq!(json["type"], json!(V4_MESSAGE_TYPE));
        assert!(Interaction::from_v4_json(&json).unwrap().is_message());

        let err = Interaction::from_v4_json(&json!({"type": "Synchronous/Messages"})).unwrap_err();
        assert!(matches!(err, PactError::InvalidPact(_)));
    }

    #[test]
    fn test_v4_rules_invalid_below_v4() {
        use crate::matchingrules::{BODY, MatchingRule};
        let mut i = interaction("a", None);
        i.response
            .matching_rules
            .add_category(BODY)
            .add_rule("$.name", MatchingRule::NotEmpty);
        let interaction = Interaction::from(i);
        assert_eq!(interaction.validate_for_version(PactSpecVersion::V3).len(), 1);
        assert!(interaction.validate_for_version(PactSpecVersion::V4).is_empty());
    }
}

//! Provider states: preconditions established before an interaction is replayed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// A named precondition with optional parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderState {
    /// State description
    pub name: String,
    /// Parameters for the state
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, Value>,
}

impl ProviderState {
    /// Create a state without parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    /// Create a state with parameters.
    #[must_use]
    pub fn with_params(name: impl Into<String>, params: BTreeMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Parse a V3+ provider state object.
    #[must_use]
    pub fn from_json(json: &Value) -> Self {
        let name = json
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let params = json
            .get("params")
            .and_then(Value::as_object)
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        Self { name, params }
    }

    /// Render a V3+ provider state object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("name".to_string(), json!(self.name));
        if !self.params.is_empty() {
            map.insert(
                "params".to_string(),
                Value::Object(self.params.clone().into_iter().collect()),
            );
        }
        Value::Object(map)
    }

    /// Read the states of an interaction, accepting both the V2 singular
    /// `providerState` and the V3 `providerStates` array.
    #[must_use]
    pub fn list_from_json(interaction: &Value) -> Vec<Self> {
        if let Some(states) = interaction.get("providerStates").and_then(Value::as_array) {
            states.iter().map(Self::from_json).collect()
        } else if let Some(name) = interaction
            .get("providerState")
            .or_else(|| interaction.get("provider_state"))
            .and_then(Value::as_str)
        {
            vec![Self::new(name)]
        } else {
            Vec::new()
        }
    }
}

/// Merge the parameters of every state into one map; later states win.
#[must_use]
pub fn merged_params(states: &[ProviderState]) -> BTreeMap<String, Value> {
    states
        .iter()
        .flat_map(|state| state.params.iter().map(|(k, v)| (k.clone(), v.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_by_name_and_params() {
        let mut params = BTreeMap::new();
        params.insert("id".to_string(), json!(10));
        let a = ProviderState::with_params("user exists", params.clone());
        let b = ProviderState::with_params("user exists", params);
        assert_eq!(a, b);
        assert_ne!(a, ProviderState::new("user exists"));
    }

    #[test]
    fn test_json_round_trip() {
        let json = json!({"name": "order exists", "params": {"orderId": 42}});
        let state = ProviderState::from_json(&json);
        assert_eq!(state.params["orderId"], json!(42));
        assert_eq!(state.to_json(), json);
    }

    #[test]
    fn test_list_from_v2_and_v3() {
        let v2 = json!({"providerState": "user exists"});
        assert_eq!(ProviderState::list_from_json(&v2), vec![ProviderState::new("user exists")]);

        let v3 = json!({"providerStates": [{"name": "a"}, {"name": "b"}]});
        let states = ProviderState::list_from_json(&v3);
        assert_eq!(states.len(), 2);
        assert_eq!(states[1].name, "b");

        assert!(ProviderState::list_from_json(&json!({})).is_empty());
    }

    #[test]
    fn test_merged_params() {
        let mut first = BTreeMap::new();
        first.insert("id".to_string(), json!(1));
        let mut second = BTreeMap::new();
        second.insert("id".to_string(), json!(2));
        second.insert("name".to_string(), json!("x"));
        let merged = merged_params(&[
            ProviderState::with_params("a", first),
            ProviderState::with_params("b", second),
        ]);
        assert_eq!(merged["id"], json!(2));
        assert_eq!(merged["name"], json!("x"));
    }
}

//! Message metadata comparison.

use crate::matchers::{json_eq, match_rules};
use crate::mismatch::Mismatch;
use pact_models::headers::json_to_string;
use pact_models::matchingrules::METADATA;
use pact_models::{ContentType, MatchingRules};
use serde_json::Value;
use std::collections::BTreeMap;

const CONTENT_TYPE_KEYS: &[&str] = &["contentType", "content-type", "Content-Type"];

fn metadata_mismatch(key: &str, expected: &Value, actual: Option<&Value>, mismatch: String) -> Mismatch {
    Mismatch::MetadataMismatch {
        key: key.to_string(),
        expected: json_to_string(expected),
        actual: actual.map(json_to_string).unwrap_or_default(),
        mismatch,
    }
}

/// Compare expected message metadata against the actual metadata. Extra
/// actual keys are allowed.
#[must_use]
pub fn match_metadata(
    expected: &BTreeMap<String, Value>,
    actual: &BTreeMap<String, Value>,
    rules: &MatchingRules,
) -> Vec<Mismatch> {
    let category = rules.category_or_empty(METADATA);
    let mut mismatches = Vec::new();

    for (key, expected_value) in expected {
        let is_content_type = CONTENT_TYPE_KEYS.contains(&key.as_str());
        let actual_value = if is_content_type {
            CONTENT_TYPE_KEYS.iter().find_map(|k| actual.get(*k))
        } else {
            actual.get(key)
        };
        let Some(actual_value) = actual_value else {
            mismatches.push(metadata_mismatch(
                key,
                expected_value,
                None,
                format!("Expected message metadata '{key}' but was missing"),
            ));
            continue;
        };

        if let Some(rules) = category.rules_for(key) {
            for failure in match_rules(expected_value, actual_value, rules) {
                mismatches.push(metadata_mismatch(key, expected_value, Some(actual_value), failure));
            }
        } else if is_content_type {
            let expected_ct = ContentType::parse(&json_to_string(expected_value));
            let actual_ct = ContentType::parse(&json_to_string(actual_value));
            if expected_ct.base_type() != actual_ct.base_type() {
                mismatches.push(metadata_mismatch(
                    key,
                    expected_value,
                    Some(actual_value),
                    format!("Expected message content type '{expected_ct}' but received '{actual_ct}'"),
                ));
            }
        } else if !json_eq(expected_value, actual_value) {
            mismatches.push(metadata_mismatch(
                key,
                expected_value,
                Some(actual_value),
                format!("Expected message metadata '{key}' to have value {expected_value} but was {actual_value}"),
            ));
        }
    }
    mismatches
}

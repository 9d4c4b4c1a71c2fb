//! Header comparison.
//!
//! Names are compared ignoring case and extra actual headers are allowed.
//! Values are compared after normalising whitespace around commas;
//! `Content-Type` is compared by base type and parameters.

use crate::matchers::match_rules;
use crate::mismatch::Mismatch;
use pact_models::headers::find_header;
use pact_models::matchingrules::HEADER;
use pact_models::{ContentType, Headers, MatchingRules};
use tracing::debug;

fn normalise(values: &[String]) -> String {
    values
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

fn header_mismatch(key: &str, expected: &str, actual: &str, mismatch: String) -> Mismatch {
    Mismatch::HeaderMismatch {
        key: key.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
        mismatch,
    }
}

fn match_content_type_header(expected: &str, actual: &str) -> Option<String> {
    let expected_ct = ContentType::parse(expected);
    let actual_ct = ContentType::parse(actual);
    if expected_ct.base_type() != actual_ct.base_type() {
        return Some(format!(
            "Expected header 'Content-Type' to have value '{expected}' but was '{actual}'"
        ));
    }
    expected_ct
        .attributes
        .iter()
        .find(|(key, value)| {
            let actual_value = actual_ct.attributes.get(*key);
            if key.as_str() == "charset" {
                !actual_value.is_some_and(|actual_value| actual_value.eq_ignore_ascii_case(value))
            } else {
                actual_value != Some(*value)
            }
        })
        .map(|(key, value)| {
            format!("Expected header 'Content-Type' to have parameter {key}={value} but was '{actual}'")
        })
}

/// Compare expected headers against actual ones.
#[must_use]
pub fn match_headers(expected: &Headers, actual: &Headers, rules: &MatchingRules) -> Vec<Mismatch> {
    let category = rules.category_or_empty(HEADER);
    let mut mismatches = Vec::new();

    for (name, expected_values) in expected {
        let expected_value = normalise(expected_values);
        let Some((_, actual_values)) = find_header(actual, name) else {
            mismatches.push(header_mismatch(
                name,
                &expected_value,
                "",
                format!("Expected a header '{name}' but was missing"),
            ));
            continue;
        };
        let actual_value = normalise(actual_values);

        if let Some(rules) = category.rules_for_name_ignore_case(name) {
            debug!(header = %name, rules = ?rules.rules, "applying header rules");
            for failure in match_rules(expected_value.as_str(), actual_value.as_str(), rules) {
                mismatches.push(header_mismatch(name, &expected_value, &actual_value, failure));
            }
        } else if name.eq_ignore_ascii_case("content-type") {
            if let Some(failure) = match_content_type_header(&expected_value, &actual_value) {
                mismatches.push(header_mismatch(name, &expected_value, &actual_value, failure));
            }
        } else if expected_value != actual_value {
            mismatches.push(header_mismatch(
                name,
                &expected_value,
                &actual_value,
                format!("Expected header '{name}' to have value '{expected_value}' but was '{actual_value}'"),
            ));
        }
    }
    mismatches
}

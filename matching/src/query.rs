//! Query parameter comparison.
//!
//! Parameters are compared by name; every expected parameter must be present
//! and unexpected parameters are mismatches.

use crate::matchers::{match_cardinality, match_rules};
use crate::mismatch::Mismatch;
use pact_models::matchingrules::QUERY;
use pact_models::{MatchingRules, QueryParams};

fn query_mismatch(parameter: &str, expected: &[String], actual: &[String], mismatch: String) -> Mismatch {
    Mismatch::QueryMismatch {
        parameter: parameter.to_string(),
        expected: expected.join(","),
        actual: actual.join(","),
        mismatch,
    }
}

/// Compare expected query parameters against actual ones.
#[must_use]
pub fn match_query(expected: &QueryParams, actual: &QueryParams, rules: &MatchingRules) -> Vec<Mismatch> {
    let category = rules.category_or_empty(QUERY);
    let mut mismatches = Vec::new();

    for (name, expected_values) in expected {
        let Some(actual_values) = actual.get(name) else {
            mismatches.push(query_mismatch(
                name,
                expected_values,
                &[],
                format!("Expected query parameter '{name}' but was missing"),
            ));
            continue;
        };

        if let Some(rules) = category.rules_for(name) {
            for failure in match_cardinality(name, actual_values.len(), rules) {
                mismatches.push(query_mismatch(name, expected_values, actual_values, failure));
            }
            let template = expected_values.first().map(String::as_str).unwrap_or_default();
            for (index, value) in actual_values.iter().enumerate() {
                let expected_value = expected_values.get(index).map_or(template, String::as_str);
                for failure in match_rules(expected_value, value.as_str(), rules) {
                    mismatches.push(query_mismatch(name, expected_values, actual_values, failure));
                }
            }
            continue;
        }

        if expected_values.len() != actual_values.len() {
            mismatches.push(query_mismatch(
                name,
                expected_values,
                actual_values,
                format!(
                    "Expected query parameter '{name}' with {} value(s) but received {} value(s)",
                    expected_values.len(),
                    actual_values.len()
                ),
            ));
        }
        for (expected_value, actual_value) in expected_values.iter().zip(actual_values) {
            if expected_value != actual_value {
                mismatches.push(query_mismatch(
                    name,
                    expected_values,
                    actual_values,
                    format!("Expected '{expected_value}' but received '{actual_value}' for query parameter '{name}'"),
                ));
            }
        }
    }

    for (name, actual_values) in actual.iter().filter(|(name, _)| !expected.contains_key(*name)) {
        mismatches.push(query_mismatch(
            name,
            &[],
            actual_values,
            format!("Unexpected query parameter '{name}' received"),
        ));
    }
    mismatches
}

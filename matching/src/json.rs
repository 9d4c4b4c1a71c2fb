//! Structural comparison of JSON documents.
//!
//! Without a rule, objects require every expected key, arrays require the
//! same length and scalars must be equal. A rule at a location replaces the
//! equality check there and, for type rules, lets arrays vary in length with
//! every actual item compared against the expected template.

use crate::context::{MatchingContext, structural_rule};
use crate::matchers::{json_eq, match_rules, type_name};
use crate::mismatch::Mismatch;
use pact_models::{DocPath, MatchingRule, MatchingRuleDefinition, RuleList, RuleLogic};
use serde_json::{Map, Value};
use tracing::debug;

/// Compare two JSON bodies.
#[must_use]
pub fn match_json(expected: &[u8], actual: &[u8], context: &MatchingContext) -> Vec<Mismatch> {
    let root = DocPath::root();
    let expected: Value = match serde_json::from_slice(expected) {
        Ok(value) => value,
        Err(err) => {
            return vec![Mismatch::body(
                root.to_string(),
                None,
                None,
                format!("Failed to parse the expected body: {err}"),
            )];
        }
    };
    let actual: Value = match serde_json::from_slice(actual) {
        Ok(value) => value,
        Err(err) => {
            return vec![Mismatch::body(
                root.to_string(),
                Some(&expected),
                None,
                format!("Failed to parse the actual body: {err}"),
            )];
        }
    };

    let mut mismatches = Vec::new();
    compare_values(&root, &expected, &actual, context, &mut mismatches);
    mismatches
}

/// Compare two JSON values at a location, appending any mismatches.
pub fn compare_values(
    path: &DocPath,
    expected: &Value,
    actual: &Value,
    context: &MatchingContext,
    mismatches: &mut Vec<Mismatch>,
) {
    let rules = context.select_best_matcher(path);
    if let Some(rules) = &rules {
        debug!(%path, rules = ?rules.rules, "applying matching rules");
        let before = mismatches.len();
        for failure in match_rules(expected, actual, rules) {
            mismatches.push(Mismatch::body(path.to_string(), Some(expected), Some(actual), failure));
        }
        match (expected, actual) {
            (Value::Object(e), Value::Object(a)) => compare_maps(path, e, a, context, Some(rules), mismatches),
            (Value::Array(e), Value::Array(a)) => compare_lists_with_rules(path, e, a, context, rules, mismatches),
            _ if mismatches.len() == before && is_container_mismatch(expected, actual) => {
                mismatches.push(type_mismatch(path, expected, actual));
            }
            _ => {}
        }
        return;
    }

    match (expected, actual) {
        (Value::Object(e), Value::Object(a)) => compare_maps(path, e, a, context, None, mismatches),
        (Value::Array(e), Value::Array(a)) => compare_lists(path, e, a, context, mismatches),
        _ if type_name(expected) != type_name(actual) => mismatches.push(type_mismatch(path, expected, actual)),
        _ if !json_eq(expected, actual) => mismatches.push(Mismatch::body(
            path.to_string(),
            Some(expected),
            Some(actual),
            format!("Expected {expected} but received {actual}"),
        )),
        _ => {}
    }
}

fn is_container_mismatch(expected: &Value, actual: &Value) -> bool {
    let container = |v: &Value| matches!(v, Value::Array(_) | Value::Object(_));
    (container(expected) || container(actual)) && type_name(expected) != type_name(actual)
}

fn type_mismatch(path: &DocPath, expected: &Value, actual: &Value) -> Mismatch {
    Mismatch::body(
        path.to_string(),
        Some(expected),
        Some(actual),
        format!(
            "Type mismatch: Expected {} {expected} but received {} {actual}",
            type_name(expected),
            type_name(actual)
        ),
    )
}

fn definition_rules(definition: &MatchingRuleDefinition) -> RuleList {
    RuleList {
        rules: definition.rules.clone(),
        rule_logic: RuleLogic::And,
        cascaded: false,
    }
}

fn compare_maps(
    path: &DocPath,
    expected: &Map<String, Value>,
    actual: &Map<String, Value>,
    context: &MatchingContext,
    rules: Option<&RuleList>,
    mismatches: &mut Vec<Mismatch>,
) {
    let structural = structural_rule(rules);

    if let Some(MatchingRule::EachKey(definition)) = structural {
        let key_rules = definition_rules(definition);
        for key in actual.keys() {
            let key_value = Value::String(key.clone());
            for failure in match_rules(&key_value, &key_value, &key_rules) {
                mismatches.push(Mismatch::body(
                    path.join(key.clone()).to_string(),
                    None,
                    Some(&key_value),
                    failure,
                ));
            }
        }
    }

    match structural {
        Some(MatchingRule::EachValue(definition)) => {
            let value_rules = definition_rules(definition);
            let template = definition.value.as_ref().or_else(|| expected.values().next());
            for (key, value) in actual {
                let item_path = path.join(key.clone());
                let expected_value = expected.get(key).or(template).unwrap_or(&Value::Null);
                for failure in match_rules(expected_value, value, &value_rules) {
                    mismatches.push(Mismatch::body(item_path.to_string(), Some(expected_value), Some(value), failure));
                }
            }
        }
        Some(_) => {
            // keys are dynamic: every actual entry is compared against its
            // expected counterpart, or the first expected entry
            let template = expected.values().next();
            for (key, value) in actual {
                if let Some(expected_value) = expected.get(key).or(template) {
                    compare_values(&path.join(key.clone()), expected_value, value, context, mismatches);
                }
            }
        }
        None => {
            for (key, expected_value) in expected {
                let item_path = path.join(key.clone());
                match actual.get(key) {
                    Some(actual_value) => compare_values(&item_path, expected_value, actual_value, context, mismatches),
                    None => mismatches.push(Mismatch::body(
                        item_path.to_string(),
                        Some(expected_value),
                        None,
                        format!("Expected {key}={expected_value} but was missing"),
                    )),
                }
            }
            if context.reject_unexpected_keys() {
                for (key, actual_value) in actual.iter().filter(|(key, _)| !expected.contains_key(*key)) {
                    mismatches.push(Mismatch::body(
                        path.join(key.clone()).to_string(),
                        None,
                        Some(actual_value),
                        format!("Received unexpected key '{key}'"),
                    ));
                }
            }
        }
    }
}

fn compare_lists_with_rules(
    path: &DocPath,
    expected: &[Value],
    actual: &[Value],
    context: &MatchingContext,
    rules: &RuleList,
    mismatches: &mut Vec<Mismatch>,
) {
    if let Some(MatchingRule::EachValue(definition)) = structural_rule(Some(rules)) {
        let value_rules = definition_rules(definition);
        let template = definition.value.as_ref().or_else(|| expected.first()).unwrap_or(&Value::Null);
        for (index, value) in actual.iter().enumerate() {
            for failure in match_rules(template, value, &value_rules) {
                mismatches.push(Mismatch::body(
                    path.join_index(index).to_string(),
                    Some(template),
                    Some(value),
                    failure,
                ));
            }
        }
        return;
    }

    if rules.type_matcher_defined() || rules.has_rule(|rule| matches!(rule, MatchingRule::Values)) {
        let Some(first) = expected.first() else {
            return;
        };
        for (index, value) in actual.iter().enumerate() {
            let template = expected.get(index).unwrap_or(first);
            compare_values(&path.join_index(index), template, value, context, mismatches);
        }
    } else {
        compare_lists(path, expected, actual, context, mismatches);
    }
}

fn compare_lists(
    path: &DocPath,
    expected: &[Value],
    actual: &[Value],
    context: &MatchingContext,
    mismatches: &mut Vec<Mismatch>,
) {
    if expected.len() != actual.len() {
        mismatches.push(Mismatch::BodyMismatch {
            path: path.to_string(),
            expected: Some(Value::Array(expected.to_vec()).to_string()),
            actual: Some(Value::Array(actual.to_vec()).to_string()),
            mismatch: format!(
                "Expected a List with {} elements but received {} elements",
                expected.len(),
                actual.len()
            ),
        });
    }
    for (index, (e, a)) in expected.iter().zip(actual).enumerate() {
        compare_values(&path.join_index(index), e, a, context, mismatches);
    }
}

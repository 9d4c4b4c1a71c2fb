//! `application/x-www-form-urlencoded` body comparison.
//!
//! Fields are addressed as `$.<name>`. Every expected field must be present;
//! a rule on a field applies to each of its values, otherwise the value lists
//! must be equal.

use crate::context::MatchingContext;
use crate::matchers::{match_cardinality, match_rules};
use crate::mismatch::Mismatch;
use indexmap::IndexMap;
use pact_models::DocPath;
use url::form_urlencoded;

fn parse_form(bytes: &[u8]) -> IndexMap<String, Vec<String>> {
    let mut fields: IndexMap<String, Vec<String>> = IndexMap::new();
    for (name, value) in form_urlencoded::parse(bytes) {
        fields.entry(name.into_owned()).or_default().push(value.into_owned());
    }
    fields
}

fn field_mismatch(path: &DocPath, expected: Option<String>, actual: Option<String>, mismatch: String) -> Mismatch {
    Mismatch::BodyMismatch {
        path: path.to_string(),
        expected,
        actual,
        mismatch,
    }
}

/// Compare two form bodies.
#[must_use]
pub fn match_form(expected: &[u8], actual: &[u8], context: &MatchingContext) -> Vec<Mismatch> {
    let expected = parse_form(expected);
    let actual = parse_form(actual);
    let root = DocPath::root();
    let mut mismatches = Vec::new();

    for (name, expected_values) in &expected {
        let path = root.join(name.clone());
        let Some(actual_values) = actual.get(name) else {
            mismatches.push(field_mismatch(
                &path,
                Some(expected_values.join(", ")),
                None,
                format!("Expected form post parameter '{name}' but was missing"),
            ));
            continue;
        };

        if let Some(rules) = context.select_best_matcher(&path) {
            for failure in match_cardinality(name, actual_values.len(), &rules) {
                mismatches.push(field_mismatch(&path, None, None, failure));
            }
            let template = expected_values.first().map(String::as_str).unwrap_or_default();
            for (index, value) in actual_values.iter().enumerate() {
                let expected_value = expected_values.get(index).map_or(template, String::as_str);
                for failure in match_rules(expected_value, value.as_str(), &rules) {
                    mismatches.push(field_mismatch(
                        &path.join_index(index),
                        Some(expected_value.to_string()),
                        Some(value.clone()),
                        failure,
                    ));
                }
            }
        } else if expected_values != actual_values {
            mismatches.push(field_mismatch(
                &path,
                Some(expected_values.join(", ")),
                Some(actual_values.join(", ")),
                format!(
                    "Expected form post parameter '{name}' with value(s) [{}] but received [{}]",
                    expected_values.join(", "),
                    actual_values.join(", ")
                ),
            ));
        }
    }

    if context.reject_unexpected_keys() {
        for (name, values) in actual.iter().filter(|(name, _)| !expected.contains_key(*name)) {
            mismatches.push(field_mismatch(
                &root.join(name.clone()),
                None,
                Some(values.join(", ")),
                format!("Received unexpected form post parameter '{name}'"),
            ));
        }
    }

    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DiffConfig, MatchingConfig};
    use pact_models::matchingrules::BODY;
    use pact_models::{MatchingRule, MatchingRules};

    fn context(rules: &[(&str, MatchingRule)]) -> MatchingContext {
        let mut matching_rules = MatchingRules::new();
        let body = matching_rules.add_category(BODY);
        for (path, rule) in rules {
            body.add_rule(*path, rule.clone());
        }
        MatchingContext::for_body(&matching_rules, &MatchingConfig::new())
    }

    #[test]
    fn test_fields_compared_by_name() {
        let ctx = context(&[]);
        assert!(match_form(b"a=1&b=2", b"b=2&a=1", &ctx).is_empty());
        assert!(match_form(b"a=1", b"a=1&extra=3", &ctx).is_empty());

        let mismatches = match_form(b"a=1&b=2", b"a=2", &ctx);
        assert_eq!(mismatches.len(), 2);
        assert_eq!(mismatches[1].location(), "$.b");
    }

    #[test]
    fn test_rules_apply_to_each_value() {
        let ctx = context(&[("$.id", MatchingRule::Integer)]);
        assert!(match_form(b"id=1", b"id=10&id=20", &ctx).is_empty());
        let mismatches = match_form(b"id=1", b"id=10&id=x", &ctx);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].location(), "$.id[1]");
    }

    #[test]
    fn test_unexpected_fields_when_strict() {
        let mut ctx = context(&[]);
        ctx.diff_config = DiffConfig::NoUnexpectedKeys;
        assert_eq!(match_form(b"a=1", b"a=1&extra=3", &ctx).len(), 1);
    }
}

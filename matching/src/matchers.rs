//! Semantics of the individual matching rules.
//!
//! Rules apply to two kinds of values: JSON values taken from structured
//! bodies and message metadata, and plain strings taken from paths, headers,
//! query parameters, form fields and XML text. Structural rules (`values`,
//! `eachKey`, `eachValue`) always pass here; the body matchers interpret them.

use once_cell::sync::Lazy;
use pact_models::date_format::{validate_date, validate_time, validate_timestamp};
use pact_models::headers::json_to_string;
use pact_models::{ContentType, MatchingRule, RuleList, RuleLogic, detect_content_type};
use regex::Regex;
use serde_json::Value;

static SEMVER: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
    )
    .ok()
});

/// A value that matching rules can be applied to.
pub trait RuleMatch {
    /// Check one rule against an actual value; `cascaded` is set when the
    /// rule was inherited from an ancestor path.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure.
    fn match_rule(&self, actual: &Self, rule: &MatchingRule, cascaded: bool) -> Result<(), String>;
}

/// Apply a rule list, honouring its combinator. Returns one message per
/// failed rule; an OR list fails only when every rule fails.
pub fn match_rules<T: RuleMatch + ?Sized>(expected: &T, actual: &T, rules: &RuleList) -> Vec<String> {
    let failures: Vec<String> = rules
        .rules
        .iter()
        .filter_map(|rule| expected.match_rule(actual, rule, rules.cascaded).err())
        .collect();
    match rules.rule_logic {
        RuleLogic::And => failures,
        RuleLogic::Or if failures.len() < rules.rules.len() => Vec::new(),
        RuleLogic::Or => failures,
    }
}

fn match_regex(pattern: &str, actual: &str) -> Result<(), String> {
    let regex = Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|err| format!("Invalid regular expression '{pattern}': {err}"))?;
    if regex.is_match(actual) {
        Ok(())
    } else {
        Err(format!("Expected '{actual}' to match '{pattern}'"))
    }
}

fn match_semver(actual: &str) -> Result<(), String> {
    match SEMVER.as_ref() {
        Some(regex) if regex.is_match(actual) => Ok(()),
        _ => Err(format!("'{actual}' is not a valid semantic version")),
    }
}

pub(crate) fn match_content_type(expected: &str, actual: &[u8]) -> Result<(), String> {
    let expected = ContentType::parse(expected);
    let detected = detect_content_type(actual);
    if expected.base_type() == detected.base_type() {
        Ok(())
    } else {
        Err(format!(
            "Expected binary contents to have content type '{expected}' but detected contents was '{detected}'"
        ))
    }
}

fn match_date_rule(rule: &MatchingRule, actual: &str) -> Result<(), String> {
    let (kind, format, result) = match rule {
        MatchingRule::Date(format) => ("date", format, validate_date(actual, format)),
        MatchingRule::Time(format) => ("time", format, validate_time(actual, format)),
        MatchingRule::Timestamp(format) => ("timestamp", format, validate_timestamp(actual, format)),
        _ => return Ok(()),
    };
    result.map_err(|err| format!("Expected '{actual}' to be a {kind} matching '{format}': {err}"))
}

/// Name of a JSON value's type for type comparison.
pub(crate) const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Bool(_) => "Boolean",
        Value::Number(_) => "Number",
        Value::String(_) => "String",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

/// Equality with numbers compared by value, so `1` equals `1.0`.
pub(crate) fn json_eq(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Number(e), Value::Number(a)) => match (e.as_i64(), a.as_i64()) {
            (Some(e), Some(a)) => e == a,
            _ => e.as_f64().zip(a.as_f64()).is_some_and(|(e, a)| (e - a).abs() <= f64::EPSILON * e.abs().max(1.0)),
        },
        _ => expected == actual,
    }
}

fn is_empty_json(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn match_type(expected: &Value, actual: &Value) -> Result<(), String> {
    if type_name(expected) == type_name(actual) {
        Ok(())
    } else {
        Err(format!(
            "Expected {actual} ({}) to be the same type as {expected} ({})",
            type_name(actual),
            type_name(expected)
        ))
    }
}

fn match_length(actual: &Value, min: Option<usize>, max: Option<usize>, cascaded: bool) -> Result<(), String> {
    let Value::Array(items) = actual else {
        return Ok(());
    };
    if cascaded {
        return Ok(());
    }
    if let Some(min) = min.filter(|min| items.len() < *min) {
        return Err(format!(
            "Expected {actual} ({} elements) to have minimum size of {min}",
            items.len()
        ));
    }
    if let Some(max) = max.filter(|max| items.len() > *max) {
        return Err(format!(
            "Expected {actual} ({} elements) to have maximum size of {max}",
            items.len()
        ));
    }
    Ok(())
}

impl RuleMatch for Value {
    fn match_rule(&self, actual: &Self, rule: &MatchingRule, cascaded: bool) -> Result<(), String> {
        match rule {
            MatchingRule::Equality => {
                if json_eq(self, actual) {
                    Ok(())
                } else {
                    Err(format!("Expected {actual} to be equal to {self}"))
                }
            }
            MatchingRule::Regex(pattern) => match actual {
                Value::Array(_) | Value::Object(_) => {
                    Err(format!("Expected {actual} to be a value matching '{pattern}'"))
                }
                _ => match_regex(pattern, &json_to_string(actual)),
            },
            MatchingRule::Type => match_type(self, actual),
            MatchingRule::MinType(min) => {
                match_type(self, actual)?;
                match_length(actual, Some(*min), None, cascaded)
            }
            MatchingRule::MaxType(max) => {
                match_type(self, actual)?;
                match_length(actual, None, Some(*max), cascaded)
            }
            MatchingRule::MinMaxType(min, max) => {
                match_type(self, actual)?;
                match_length(actual, Some(*min), Some(*max), cascaded)
            }
            MatchingRule::Date(_) | MatchingRule::Time(_) | MatchingRule::Timestamp(_) => match actual {
                Value::String(s) => match_date_rule(rule, s),
                other => Err(format!("Expected {other} to be a string with a {}", rule.name())),
            },
            MatchingRule::Include(value) => {
                if json_to_string(actual).contains(value.as_str()) {
                    Ok(())
                } else {
                    Err(format!("Expected {actual} to include '{value}'"))
                }
            }
            MatchingRule::Number => {
                if actual.is_number() {
                    Ok(())
                } else {
                    Err(format!("Expected {actual} to be a number"))
                }
            }
            MatchingRule::Integer => {
                if actual.is_i64() || actual.is_u64() {
                    Ok(())
                } else {
                    Err(format!("Expected {actual} to be an integer"))
                }
            }
            MatchingRule::Decimal => {
                if actual.is_f64() {
                    Ok(())
                } else {
                    Err(format!("Expected {actual} to be a decimal number"))
                }
            }
            MatchingRule::Null => {
                if actual.is_null() {
                    Ok(())
                } else {
                    Err(format!("Expected {actual} to be null"))
                }
            }
            MatchingRule::Boolean => match actual {
                Value::Bool(_) => Ok(()),
                Value::String(s) if s == "true" || s == "false" => Ok(()),
                other => Err(format!("Expected {other} to be a boolean")),
            },
            MatchingRule::ContentType(content_type) => {
                match_content_type(content_type, json_to_string(actual).as_bytes())
            }
            MatchingRule::NotEmpty => {
                if is_empty_json(actual) {
                    Err(format!("Expected {actual} to not be empty"))
                } else {
                    match_type(self, actual)
                }
            }
            MatchingRule::Semver => match actual {
                Value::String(s) => match_semver(s),
                other => Err(format!("Expected {other} to be a semantic version string")),
            },
            MatchingRule::Values | MatchingRule::EachKey(_) | MatchingRule::EachValue(_) => Ok(()),
        }
    }
}

impl RuleMatch for str {
    fn match_rule(&self, actual: &Self, rule: &MatchingRule, _cascaded: bool) -> Result<(), String> {
        match rule {
            MatchingRule::Equality => {
                if self == actual {
                    Ok(())
                } else {
                    Err(format!("Expected '{actual}' to be equal to '{self}'"))
                }
            }
            MatchingRule::Regex(pattern) => match_regex(pattern, actual),
            MatchingRule::Date(_) | MatchingRule::Time(_) | MatchingRule::Timestamp(_) => {
                match_date_rule(rule, actual)
            }
            MatchingRule::Include(value) => {
                if actual.contains(value.as_str()) {
                    Ok(())
                } else {
                    Err(format!("Expected '{actual}' to include '{value}'"))
                }
            }
            MatchingRule::Number => actual
                .parse::<f64>()
                .map(|_| ())
                .map_err(|_| format!("Expected '{actual}' to be a number")),
            MatchingRule::Integer => actual
                .parse::<i64>()
                .map(|_| ())
                .map_err(|_| format!("Expected '{actual}' to be an integer")),
            MatchingRule::Decimal => {
                if actual.contains('.') && actual.parse::<f64>().is_ok() {
                    Ok(())
                } else {
                    Err(format!("Expected '{actual}' to be a decimal number"))
                }
            }
            MatchingRule::Null => {
                if actual.is_empty() {
                    Ok(())
                } else {
                    Err(format!("Expected '{actual}' to be empty"))
                }
            }
            MatchingRule::Boolean => {
                if actual == "true" || actual == "false" {
                    Ok(())
                } else {
                    Err(format!("Expected '{actual}' to be a boolean"))
                }
            }
            MatchingRule::ContentType(content_type) => match_content_type(content_type, actual.as_bytes()),
            MatchingRule::NotEmpty => {
                if actual.is_empty() {
                    Err("Expected a non-empty value".to_string())
                } else {
                    Ok(())
                }
            }
            MatchingRule::Semver => match_semver(actual),
            MatchingRule::Type
            | MatchingRule::MinType(_)
            | MatchingRule::MaxType(_)
            | MatchingRule::MinMaxType(_, _)
            | MatchingRule::Values
            | MatchingRule::EachKey(_)
            | MatchingRule::EachValue(_) => Ok(()),
        }
    }
}

/// Check the number of values of a multi-valued field (query parameter,
/// header, form field) against the min/max rules of its list.
pub(crate) fn match_cardinality(name: &str, count: usize, rules: &RuleList) -> Vec<String> {
    rules
        .rules
        .iter()
        .filter_map(|rule| {
            let (min, max) = match rule {
                MatchingRule::MinType(min) => (Some(*min), None),
                MatchingRule::MaxType(max) => (None, Some(*max)),
                MatchingRule::MinMaxType(min, max) => (Some(*min), Some(*max)),
                _ => return None,
            };
            if min.is_some_and(|min| count < min) {
                Some(format!(
                    "Expected '{name}' to have at least {} value(s) but received {count}",
                    min.unwrap_or_default()
                ))
            } else if max.is_some_and(|max| count > max) {
                Some(format!(
                    "Expected '{name}' to have at most {} value(s) but received {count}",
                    max.unwrap_or_default()
                ))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pact_models::MatchingRuleDefinition;
    use serde_json::json;

    fn check(expected: &Value, actual: &Value, rule: MatchingRule) -> Result<(), String> {
        expected.match_rule(actual, &rule, false)
    }

    #[test]
    fn test_type_rule() {
        assert!(check(&json!(1), &json!(200), MatchingRule::Type).is_ok());
        assert!(check(&json!(1), &json!(2.5), MatchingRule::Type).is_ok());
        assert!(check(&json!(1), &json!("1"), MatchingRule::Type).is_err());
        assert!(check(&json!({"a": 1}), &json!({}), MatchingRule::Type).is_ok());
    }

    #[test]
    fn test_min_max_type() {
        assert!(check(&json!([1]), &json!([1, 2]), MatchingRule::MinType(1)).is_ok());
        assert!(check(&json!([1]), &json!([]), MatchingRule::MinType(1)).is_err());
        assert!(check(&json!([1]), &json!([1, 2, 3]), MatchingRule::MaxType(2)).is_err());
        assert!(check(&json!([1]), &json!([1, 2]), MatchingRule::MinMaxType(1, 2)).is_ok());
        // inherited length constraints do not apply
        assert!(json!([1]).match_rule(&json!([]), &MatchingRule::MinType(1), true).is_ok());
    }

    #[test]
    fn test_regex_rule() {
        let rule = MatchingRule::Regex("\\d+".to_string());
        assert!(check(&json!("1"), &json!("1234"), rule.clone()).is_ok());
        assert!(check(&json!("1"), &json!(1234), rule.clone()).is_ok());
        assert!(check(&json!("1"), &json!("12a"), rule.clone()).is_err());
        assert!(check(&json!("1"), &json!(["1"]), rule).is_err());
        assert!(check(&json!("1"), &json!("1"), MatchingRule::Regex("(".to_string())).is_err());
    }

    #[test]
    fn test_number_rules() {
        assert!(check(&json!(1), &json!(100), MatchingRule::Integer).is_ok());
        assert!(check(&json!(1), &json!(1.5), MatchingRule::Integer).is_err());
        assert!(check(&json!(1.5), &json!(2.25), MatchingRule::Decimal).is_ok());
        assert!(check(&json!(1.5), &json!(2), MatchingRule::Decimal).is_err());
        assert!(check(&json!(1), &json!(2.5), MatchingRule::Number).is_ok());
        assert!(check(&json!(1), &json!("2"), MatchingRule::Number).is_err());
    }

    #[test]
    fn test_date_rules() {
        let date = MatchingRule::Date("yyyy-MM-dd".to_string());
        assert!(check(&json!("2024-01-01"), &json!("2024-02-29"), date.clone()).is_ok());
        assert!(check(&json!("2024-01-01"), &json!("29/02/2024"), date.clone()).is_err());
        assert!(check(&json!("2024-01-01"), &json!(20240229), date).is_err());
        let timestamp = MatchingRule::Timestamp(String::new());
        assert!(check(&json!(""), &json!("2024-01-31T10:00:00Z"), timestamp).is_ok());
    }

    #[test]
    fn test_v4_rules() {
        assert!(check(&json!("a"), &json!(""), MatchingRule::NotEmpty).is_err());
        assert!(check(&json!([1]), &json!([2]), MatchingRule::NotEmpty).is_ok());
        assert!(check(&json!("1.0.0"), &json!("2.10.3-beta.1"), MatchingRule::Semver).is_ok());
        assert!(check(&json!("1.0.0"), &json!("2.10"), MatchingRule::Semver).is_err());
        let each = MatchingRule::EachValue(MatchingRuleDefinition::new(vec![MatchingRule::Integer]));
        assert!(check(&json!({}), &json!({"a": "b"}), each).is_ok());
    }

    #[test]
    fn test_string_rules() {
        assert!("1".match_rule("42", &MatchingRule::Integer, false).is_ok());
        assert!("1".match_rule("4.2", &MatchingRule::Integer, false).is_err());
        assert!("1.0".match_rule("4.2", &MatchingRule::Decimal, false).is_ok());
        assert!("a".match_rule("b", &MatchingRule::Type, false).is_ok());
        assert!("a".match_rule("b", &MatchingRule::Equality, false).is_err());
        assert!("true".match_rule("false", &MatchingRule::Boolean, false).is_ok());
    }

    #[test]
    fn test_rule_logic() {
        let mut list = RuleList::new(MatchingRule::Integer);
        list.add_rule(MatchingRule::Regex("\\d{3}".to_string()));
        assert_eq!(match_rules(&json!(1), &json!(12), &list).len(), 1);

        list.rule_logic = RuleLogic::Or;
        assert!(match_rules(&json!(1), &json!(12), &list).is_empty());
        assert_eq!(match_rules(&json!(1), &json!("x"), &list).len(), 2);
    }

    #[test]
    fn test_cardinality() {
        let list = RuleList::new(MatchingRule::MinType(2));
        assert_eq!(match_cardinality("id", 1, &list).len(), 1);
        assert!(match_cardinality("id", 2, &list).is_empty());
    }
}

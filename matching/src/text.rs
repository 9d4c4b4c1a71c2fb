//! Whole-body text comparison.

use crate::context::MatchingContext;
use crate::matchers::match_rules;
use crate::mismatch::Mismatch;
use pact_models::DocPath;

/// Compare two text bodies: a rule at `$` applies to the whole text,
/// otherwise the texts must be equal.
#[must_use]
pub fn match_text(expected: &[u8], actual: &[u8], context: &MatchingContext) -> Vec<Mismatch> {
    let root = DocPath::root();
    let expected = String::from_utf8_lossy(expected);
    let actual = String::from_utf8_lossy(actual);

    let failures = match context.select_best_matcher(&root) {
        Some(rules) => match_rules(&*expected, &*actual, &rules),
        None if expected == actual => Vec::new(),
        None => vec![format!("Expected body '{expected}' to match '{actual}' using equality but did not match")],
    };

    failures
        .into_iter()
        .map(|mismatch| Mismatch::BodyMismatch {
            path: root.to_string(),
            expected: Some(expected.to_string()),
            actual: Some(actual.to_string()),
            mismatch,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MatchingConfig;
    use pact_models::matchingrules::BODY;
    use pact_models::{MatchingRule, MatchingRules};

    #[test]
    fn test_equality() {
        let context = MatchingContext::for_body(&MatchingRules::new(), &MatchingConfig::new());
        assert!(match_text(b"hello", b"hello", &context).is_empty());
        assert_eq!(match_text(b"hello", b"world", &context).len(), 1);
    }

    #[test]
    fn test_rule_at_root() {
        let mut rules = MatchingRules::new();
        rules
            .add_category(BODY)
            .add_rule("$", MatchingRule::Regex("order-\\d+".to_string()));
        let context = MatchingContext::for_body(&rules, &MatchingConfig::new());
        assert!(match_text(b"order-1", b"order-42", &context).is_empty());
        assert_eq!(match_text(b"order-1", b"order-x", &context).len(), 1);
    }
}

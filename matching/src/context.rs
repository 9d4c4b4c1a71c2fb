//! Per-comparison matching context.

use crate::registry::{DiffConfig, MatchingConfig};
use pact_models::{Category, DocPath, MatchingRule, MatchingRules, RuleList};
use pact_models::matchingrules::BODY;

/// Rules of one category together with the comparison settings.
///
/// A context is built for every comparison and owned by it, so concurrent
/// comparisons never share mutable state.
#[derive(Debug, Clone)]
pub struct MatchingContext {
    /// Rules in effect
    pub rules: Category,
    /// Strictness for unexpected keys
    pub diff_config: DiffConfig,
    /// Body matcher selection
    pub config: MatchingConfig,
}

impl MatchingContext {
    /// Create a context over a category of rules.
    #[must_use]
    pub fn new(rules: Category, config: &MatchingConfig) -> Self {
        Self {
            rules,
            diff_config: config.diff_config,
            config: config.clone(),
        }
    }

    /// Context for the body rules of a part.
    #[must_use]
    pub fn for_body(rules: &MatchingRules, config: &MatchingConfig) -> Self {
        Self::new(rules.category_or_empty(BODY), config)
    }

    /// Whether any rule governs the path.
    #[must_use]
    pub fn matcher_is_defined(&self, path: &DocPath) -> bool {
        self.rules.matcher_is_defined(path)
    }

    /// The rules governing the path.
    #[must_use]
    pub fn select_best_matcher(&self, path: &DocPath) -> Option<RuleList> {
        self.rules.select_best_matcher(path)
    }

    /// Whether an unexpected key at this path is a mismatch.
    #[must_use]
    pub fn reject_unexpected_keys(&self) -> bool {
        self.diff_config == DiffConfig::NoUnexpectedKeys
    }

    /// A context over the rules below `prefix`, re-rooted so that
    /// `$.<prefix>.x` becomes `$.x`.
    #[must_use]
    pub fn rerooted(&self, prefix: &DocPath) -> Self {
        let mut rules = Category::new(self.rules.name.clone());
        for (key, list) in &self.rules.rules {
            let Ok(path) = DocPath::parse(key) else {
                continue;
            };
            if let Some(stripped) = path.strip_prefix(prefix) {
                rules.rules.insert(stripped.to_string(), list.clone());
            }
        }
        Self {
            rules,
            diff_config: self.diff_config,
            config: self.config.clone(),
        }
    }
}

/// First V4 structural rule of a list that is declared at the path itself.
pub(crate) fn structural_rule(rules: Option<&RuleList>) -> Option<&MatchingRule> {
    rules.filter(|list| !list.cascaded).and_then(|list| {
        list.rules.iter().find(|rule| {
            matches!(
                rule,
                MatchingRule::Values | MatchingRule::EachKey(_) | MatchingRule::EachValue(_)
            )
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rerooted_strips_prefix() {
        let mut rules = MatchingRules::new();
        let body = rules.add_category(BODY);
        body.add_rule("$.file.name", MatchingRule::Type);
        body.add_rule("$.other", MatchingRule::Integer);
        let context = MatchingContext::for_body(&rules, &MatchingConfig::new());

        let prefix = DocPath::root().join("file");
        let rerooted = context.rerooted(&prefix);
        assert_eq!(rerooted.rules.rules.len(), 1);
        assert!(rerooted.matcher_is_defined(&DocPath::root().join("name")));
        assert!(!rerooted.matcher_is_defined(&DocPath::root().join("other")));
    }

    #[test]
    fn test_structural_rule_only_at_own_path() {
        let list = RuleList::new(MatchingRule::Values);
        assert_eq!(structural_rule(Some(&list)), Some(&MatchingRule::Values));
        let mut inherited = list.clone();
        inherited.cascaded = true;
        assert_eq!(structural_rule(Some(&inherited)), None);
    }
}

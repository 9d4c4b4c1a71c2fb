//! Matching rules attached to locations inside an interaction.
//!
//! Rules are grouped by category (`path`, `query`, `header`, `body`,
//! `metadata`, ...) and, inside a category, keyed by a path expression or a
//! header/parameter name.

use crate::path_exp::DocPath;
use crate::spec_version::PactSpecVersion;
use pact_common::{PactError, PactResult};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Category holding rules for the request/response body or message contents.
pub const BODY: &str = "body";
/// Category holding rules for headers.
pub const HEADER: &str = "header";
/// Category holding rules for query parameters.
pub const QUERY: &str = "query";
/// Category holding rules for the request path.
pub const PATH: &str = "path";
/// Category holding rules for message metadata.
pub const METADATA: &str = "metadata";
/// Category holding rules for the response status.
pub const STATUS: &str = "status";

/// Inner definition of the V4 `eachKey` and `eachValue` rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingRuleDefinition {
    /// Example value the rules were defined with
    pub value: Option<Value>,
    /// Rules applied to every key or value
    pub rules: Vec<MatchingRule>,
}

impl MatchingRuleDefinition {
    /// Create a definition from a list of rules.
    #[must_use]
    pub const fn new(rules: Vec<MatchingRule>) -> Self {
        Self { value: None, rules }
    }
}

/// A single matching rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchingRule {
    /// Values must be equal
    Equality,
    /// String form must match the regular expression
    Regex(String),
    /// Values must have the same JSON type
    Type,
    /// Same type, arrays must have at least n items
    MinType(usize),
    /// Same type, arrays must have at most n items
    MaxType(usize),
    /// Same type, arrays must have between min and max items
    MinMaxType(usize, usize),
    /// String must parse as a timestamp in the format
    Timestamp(String),
    /// String must parse as a time in the format
    Time(String),
    /// String must parse as a date in the format
    Date(String),
    /// String form must contain the value
    Include(String),
    /// Value must be a number
    Number,
    /// Value must be an integer
    Integer,
    /// Value must be a decimal number
    Decimal,
    /// Value must be null
    Null,
    /// Value must be a boolean
    Boolean,
    /// Body must have the content type
    ContentType(String),
    /// Map keys are ignored, values are compared against the expected template
    Values,
    /// Value must not be empty (V4)
    NotEmpty,
    /// Value must be a semantic version (V4)
    Semver,
    /// Every key of a map must match the rules (V4)
    EachKey(MatchingRuleDefinition),
    /// Every value of a map or array must match the rules (V4)
    EachValue(MatchingRuleDefinition),
}

impl MatchingRule {
    /// Parse a matcher definition from a pact document.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::UnsupportedMatcher`] for unknown `match` values
    /// and [`PactError::InvalidPact`] for definitions missing required fields.
    pub fn from_json(json: &Value) -> PactResult<Self> {
        let Some(map) = json.as_object() else {
            return Err(PactError::invalid_pact(format!(
                "Matching rule must be a JSON object, got {json}"
            )));
        };

        let Some(match_type) = map.get("match").and_then(Value::as_str) else {
            return Self::from_v2_shorthand(map);
        };

        let rule = match match_type {
            "equality" => Self::Equality,
            "regex" => Self::Regex(required_str(map, "regex", match_type)?),
            "type" => match (usize_field(map, "min"), usize_field(map, "max")) {
                (Some(min), Some(max)) => Self::MinMaxType(min, max),
                (Some(min), None) => Self::MinType(min),
                (None, Some(max)) => Self::MaxType(max),
                (None, None) => Self::Type,
            },
            "min" => Self::MinType(
                usize_field(map, "min").ok_or_else(|| missing_field("min", match_type))?,
            ),
            "max" => Self::MaxType(
                usize_field(map, "max").ok_or_else(|| missing_field("max", match_type))?,
            ),
            "timestamp" | "datetime" => Self::Timestamp(format_field(map, &["format", "timestamp", "datetime"])),
            "date" => Self::Date(format_field(map, &["format", "date"])),
            "time" => Self::Time(format_field(map, &["format", "time"])),
            "include" => Self::Include(required_str(map, "value", match_type)?),
            "number" => Self::Number,
            "integer" => Self::Integer,
            "decimal" | "real" => Self::Decimal,
            "null" => Self::Null,
            "boolean" => Self::Boolean,
            "contentType" | "content-type" => Self::ContentType(required_str(map, "value", match_type)?),
            "values" => Self::Values,
            "notEmpty" | "not-empty" => Self::NotEmpty,
            "semver" => Self::Semver,
            "eachKey" | "each-key" => Self::EachKey(definition_from_json(map)?),
            "eachValue" | "each-value" => Self::EachValue(definition_from_json(map)?),
            other => return Err(PactError::unsupported_matcher(other)),
        };
        Ok(rule)
    }

    fn from_v2_shorthand(map: &Map<String, Value>) -> PactResult<Self> {
        if let Some(regex) = map.get("regex").and_then(Value::as_str) {
            return Ok(Self::Regex(regex.to_string()));
        }
        match (usize_field(map, "min"), usize_field(map, "max")) {
            (Some(min), Some(max)) => return Ok(Self::MinMaxType(min, max)),
            (Some(min), None) => return Ok(Self::MinType(min)),
            (None, Some(max)) => return Ok(Self::MaxType(max)),
            (None, None) => {}
        }
        if let Some(format) = map.get("timestamp").and_then(Value::as_str) {
            return Ok(Self::Timestamp(format.to_string()));
        }
        if let Some(format) = map.get("date").and_then(Value::as_str) {
            return Ok(Self::Date(format.to_string()));
        }
        if let Some(format) = map.get("time").and_then(Value::as_str) {
            return Ok(Self::Time(format.to_string()));
        }
        warn!(rule = ?map, "matching rule has no match type, defaulting to equality");
        Ok(Self::Equality)
    }

    /// Render the rule for a pact document.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Equality => json!({"match": "equality"}),
            Self::Regex(regex) => json!({"match": "regex", "regex": regex}),
            Self::Type => json!({"match": "type"}),
            Self::MinType(min) => json!({"match": "type", "min": min}),
            Self::MaxType(max) => json!({"match": "type", "max": max}),
            Self::MinMaxType(min, max) => json!({"match": "type", "min": min, "max": max}),
            Self::Timestamp(format) => format_json("timestamp", format),
            Self::Time(format) => format_json("time", format),
            Self::Date(format) => format_json("date", format),
            Self::Include(value) => json!({"match": "include", "value": value}),
            Self::Number => json!({"match": "number"}),
            Self::Integer => json!({"match": "integer"}),
            Self::Decimal => json!({"match": "decimal"}),
            Self::Null => json!({"match": "null"}),
            Self::Boolean => json!({"match": "boolean"}),
            Self::ContentType(value) => json!({"match": "contentType", "value": value}),
            Self::Values => json!({"match": "values"}),
            Self::NotEmpty => json!({"match": "notEmpty"}),
            Self::Semver => json!({"match": "semver"}),
            Self::EachKey(definition) => definition_to_json("eachKey", definition),
            Self::EachValue(definition) => definition_to_json("eachValue", definition),
        }
    }

    /// Name of the rule as used in mismatch descriptions.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Equality => "equality",
            Self::Regex(_) => "regex",
            Self::Type => "type",
            Self::MinType(_) => "min-type",
            Self::MaxType(_) => "max-type",
            Self::MinMaxType(_, _) => "min-max-type",
            Self::Timestamp(_) => "timestamp",
            Self::Time(_) => "time",
            Self::Date(_) => "date",
            Self::Include(_) => "include",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::ContentType(_) => "content-type",
            Self::Values => "values",
            Self::NotEmpty => "not-empty",
            Self::Semver => "semver",
            Self::EachKey(_) => "each-key",
            Self::EachValue(_) => "each-value",
        }
    }

    /// Problems with using this rule in a document of the given version.
    #[must_use]
    pub fn validate_for_version(&self, version: PactSpecVersion) -> Vec<String> {
        let v4_only = matches!(
            self,
            Self::NotEmpty | Self::Semver | Self::EachKey(_) | Self::EachValue(_)
        );
        let mut errors = Vec::new();
        if v4_only && version < PactSpecVersion::V4 {
            errors.push(format!(
                "{} matchers can only be used with Pact specification versions >= V4",
                self.name()
            ));
        }
        if let Self::EachKey(definition) | Self::EachValue(definition) = self {
            for rule in &definition.rules {
                errors.extend(rule.validate_for_version(version));
            }
        }
        errors
    }

    /// Whether the rule still applies when inherited by a descendant path.
    #[must_use]
    pub const fn can_cascade(&self) -> bool {
        !matches!(
            self,
            Self::Values | Self::EachKey(_) | Self::EachValue(_) | Self::NotEmpty | Self::ContentType(_)
        )
    }

    /// The form of the rule applied to descendants of the path it was defined on.
    ///
    /// Cardinality constraints only apply to the collection they were declared
    /// on, so inherited min/max rules become plain type rules.
    #[must_use]
    pub fn cascaded(&self) -> Option<Self> {
        match self {
            Self::MinType(_) | Self::MaxType(_) | Self::MinMaxType(_, _) => Some(Self::Type),
            rule if rule.can_cascade() => Some(rule.clone()),
            _ => None,
        }
    }

    /// Whether this rule only checks the type of a value.
    #[must_use]
    pub const fn is_type_matcher(&self) -> bool {
        matches!(
            self,
            Self::Type | Self::MinType(_) | Self::MaxType(_) | Self::MinMaxType(_, _)
        )
    }
}

impl fmt::Display for MatchingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(regex) => write!(f, "regex '{regex}'"),
            Self::MinType(min) => write!(f, "type with min {min}"),
            Self::MaxType(max) => write!(f, "type with max {max}"),
            Self::MinMaxType(min, max) => write!(f, "type with min {min} and max {max}"),
            Self::Timestamp(format) | Self::Time(format) | Self::Date(format) if !format.is_empty() => {
                write!(f, "{} '{format}'", self.name())
            }
            Self::Include(value) => write!(f, "include '{value}'"),
            Self::ContentType(value) => write!(f, "content type '{value}'"),
            _ => write!(f, "{}", self.name()),
        }
    }
}

fn missing_field(field: &str, match_type: &str) -> PactError {
    PactError::invalid_pact(format!(
        "Matching rule '{match_type}' is missing the required '{field}' attribute"
    ))
}

fn required_str(map: &Map<String, Value>, field: &str, match_type: &str) -> PactResult<String> {
    map.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| missing_field(field, match_type))
}

fn usize_field(map: &Map<String, Value>, field: &str) -> Option<usize> {
    match map.get(field)? {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn format_field(map: &Map<String, Value>, fields: &[&str]) -> String {
    fields
        .iter()
        .find_map(|field| map.get(*field).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

fn format_json(match_type: &str, format: &str) -> Value {
    if format.is_empty() {
        json!({"match": match_type})
    } else {
        json!({"match": match_type, "format": format})
    }
}

fn definition_from_json(map: &Map<String, Value>) -> PactResult<MatchingRuleDefinition> {
    let rules = map
        .get("rules")
        .and_then(Value::as_array)
        .map(|rules| rules.iter().map(MatchingRule::from_json).collect::<PactResult<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();
    Ok(MatchingRuleDefinition {
        value: map.get("value").cloned(),
        rules,
    })
}

fn definition_to_json(match_type: &str, definition: &MatchingRuleDefinition) -> Value {
    let mut map = Map::new();
    map.insert("match".to_string(), json!(match_type));
    map.insert(
        "rules".to_string(),
        Value::Array(definition.rules.iter().map(MatchingRule::to_json).collect()),
    );
    if let Some(value) = &definition.value {
        map.insert("value".to_string(), value.clone());
    }
    Value::Object(map)
}

/// How the rules of a list are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RuleLogic {
    /// Every rule must pass
    #[default]
    And,
    /// Any single rule suffices
    Or,
}

impl RuleLogic {
    /// Name written to `combine`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// An ordered set of rules attached to one path, with their combinator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleList {
    /// The rules, in declaration order without duplicates
    pub rules: Vec<MatchingRule>,
    /// How the rules combine
    pub rule_logic: RuleLogic,
    /// Whether the list was inherited from an ancestor path
    pub cascaded: bool,
}

impl RuleList {
    /// An empty list with the given combinator.
    #[must_use]
    pub const fn empty(rule_logic: RuleLogic) -> Self {
        Self {
            rules: Vec::new(),
            rule_logic,
            cascaded: false,
        }
    }

    /// A list holding a single rule.
    #[must_use]
    pub fn new(rule: MatchingRule) -> Self {
        Self {
            rules: vec![rule],
            rule_logic: RuleLogic::And,
            cascaded: false,
        }
    }

    /// Add a rule, ignoring duplicates.
    pub fn add_rule(&mut self, rule: MatchingRule) {
        if !self.rules.contains(&rule) {
            self.rules.push(rule);
        }
    }

    /// Whether the list holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any rule satisfies the predicate.
    #[must_use]
    pub fn has_rule(&self, predicate: impl Fn(&MatchingRule) -> bool) -> bool {
        self.rules.iter().any(predicate)
    }

    /// Whether every rule only checks types.
    #[must_use]
    pub fn type_matcher_defined(&self) -> bool {
        self.rules.iter().any(MatchingRule::is_type_matcher)
    }

    /// The list as applied to a descendant path.
    #[must_use]
    pub fn as_cascaded(&self) -> Self {
        Self {
            rules: self.rules.iter().filter_map(MatchingRule::cascaded).collect(),
            rule_logic: self.rule_logic,
            cascaded: true,
        }
    }

    /// Union of two lists; OR wins if either list is OR-combinable.
    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        let mut combined = self.clone();
        for rule in &other.rules {
            combined.add_rule(rule.clone());
        }
        if other.rule_logic == RuleLogic::Or {
            combined.rule_logic = RuleLogic::Or;
        }
        combined.cascaded = self.cascaded && other.cascaded;
        combined
    }

    /// Problems with using these rules in a document of the given version.
    #[must_use]
    pub fn validate_for_version(&self, version: PactSpecVersion) -> Vec<String> {
        let mut errors = Vec::new();
        if version < PactSpecVersion::V3 {
            if self.rules.len() > 1 {
                errors.push(format!(
                    "{} rules at one path need Pact specification version >= V3",
                    self.rules.len()
                ));
            }
            if self.rule_logic == RuleLogic::Or {
                errors.push("OR combined rules need Pact specification version >= V3".to_string());
            }
        }
        errors.extend(self.rules.iter().flat_map(|rule| rule.validate_for_version(version)));
        errors
    }

    /// Render the V3 `{"matchers": [...], "combine": ...}` form.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "matchers": self.rules.iter().map(MatchingRule::to_json).collect::<Vec<_>>(),
            "combine": self.rule_logic.as_str(),
        })
    }

    /// Parse the V3 form, or a single V2 rule object.
    ///
    /// # Errors
    ///
    /// Propagates rule parsing errors.
    pub fn from_json(json: &Value) -> PactResult<Self> {
        let logic = match json.get("combine").and_then(Value::as_str) {
            Some(combine) if combine.eq_ignore_ascii_case("OR") => RuleLogic::Or,
            Some(combine) if combine.eq_ignore_ascii_case("AND") => RuleLogic::And,
            Some(other) => {
                return Err(PactError::invalid_pact(format!(
                    "Rule combinator must be AND or OR, got '{other}'"
                )));
            }
            None => RuleLogic::And,
        };

        let mut list = Self::empty(logic);
        match json.get("matchers") {
            Some(Value::Array(matchers)) => {
                for matcher in matchers {
                    list.add_rule(MatchingRule::from_json(matcher)?);
                }
            }
            Some(other) => {
                return Err(PactError::invalid_pact(format!(
                    "Matchers must be an array, got {other}"
                )));
            }
            None => list.add_rule(MatchingRule::from_json(json)?),
        }
        Ok(list)
    }
}

/// Rules of one category, keyed by path expression or name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Category {
    /// Category name
    pub name: String,
    /// Rules per key
    pub rules: BTreeMap<String, RuleList>,
}

impl Category {
    /// Create an empty category.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: BTreeMap::new(),
        }
    }

    /// Add a rule at a key with the default AND combinator.
    pub fn add_rule(&mut self, key: impl Into<String>, rule: MatchingRule) {
        self.add_rule_with_logic(key, rule, RuleLogic::And);
    }

    /// Add a rule at a key; an OR combinator marks the whole list OR-combinable.
    pub fn add_rule_with_logic(&mut self, key: impl Into<String>, rule: MatchingRule, logic: RuleLogic) {
        let list = self
            .rules
            .entry(key.into())
            .or_insert_with(|| RuleList::empty(logic));
        if logic == RuleLogic::Or {
            list.rule_logic = RuleLogic::Or;
        }
        list.add_rule(rule);
    }

    /// Whether the category holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.values().all(RuleList::is_empty)
    }

    /// Rules declared at exactly this key.
    #[must_use]
    pub fn rules_for(&self, key: &str) -> Option<&RuleList> {
        self.rules.get(key)
    }

    /// Rules declared for a name, ignoring case (used for headers).
    #[must_use]
    pub fn rules_for_name_ignore_case(&self, name: &str) -> Option<&RuleList> {
        self.rules
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, list)| list)
    }

    /// Ordered merge: rules from `other` replace ours at the same key.
    pub fn merge(&mut self, other: &Self) {
        for (key, list) in &other.rules {
            self.rules.insert(key.clone(), list.clone());
        }
    }

    /// Keep only the rules matching a predicate on their key.
    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&str) -> bool) -> Self {
        Self {
            name: self.name.clone(),
            rules: self
                .rules
                .iter()
                .filter(|(key, _)| predicate(key))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Path expressions of this category with their rules; keys that are not
    /// valid path expressions are skipped.
    fn path_rules(&self) -> impl Iterator<Item = (DocPath, &RuleList)> {
        self.rules.iter().filter_map(|(key, list)| match DocPath::parse(key) {
            Ok(path) => Some((path, list)),
            Err(err) => {
                debug!(key, error = %err, "ignoring rule key that is not a path expression");
                None
            }
        })
    }

    /// Every rule whose expression matches the concrete path, with its weight.
    #[must_use]
    pub fn resolve_matchers_for_path(&self, path: &DocPath) -> Vec<(DocPath, usize, &RuleList)> {
        let mut resolved: Vec<_> = self
            .path_rules()
            .filter_map(|(exp, list)| {
                let weight = exp.match_weight(path);
                (weight > 0).then_some((exp, weight, list))
            })
            .collect();
        resolved.sort_by(|a, b| b.1.cmp(&a.1));
        resolved
    }

    /// Whether any rule applies at the path, directly or inherited.
    #[must_use]
    pub fn matcher_is_defined(&self, path: &DocPath) -> bool {
        self.select_best_matcher(path).is_some_and(|list| !list.is_empty())
    }

    /// The rules that govern a concrete path.
    ///
    /// The highest weighted expressions win. When several expressions tie,
    /// ones addressing the path itself beat inherited ones, and the remaining
    /// lists are combined. An inherited list only keeps rules that cascade.
    #[must_use]
    pub fn select_best_matcher(&self, path: &DocPath) -> Option<RuleList> {
        let resolved = self.resolve_matchers_for_path(path);
        let best_weight = resolved.first()?.1;
        let best: Vec<_> = resolved
            .into_iter()
            .filter(|(_, weight, _)| *weight == best_weight)
            .collect();

        let exact: Vec<_> = best
            .iter()
            .filter(|(exp, _, _)| exp.matches_exactly(path))
            .collect();

        let selected = if exact.is_empty() {
            best.iter()
                .map(|(_, _, list)| list.as_cascaded())
                .reduce(|acc, list| acc.combine(&list))
        } else {
            exact
                .iter()
                .map(|(_, _, list)| (*list).clone())
                .reduce(|acc, list| acc.combine(&list))
        };

        selected.filter(|list| !list.is_empty())
    }

    /// Whether a rule is declared at exactly this path.
    #[must_use]
    pub fn rules_at_exact_path(&self, path: &DocPath) -> Option<RuleList> {
        self.path_rules()
            .filter(|(exp, _)| exp.matches_exactly(path))
            .max_by_key(|(exp, _)| exp.match_weight(path))
            .map(|(_, list)| list.clone())
    }

    /// Problems with using this category in a document of the given version.
    #[must_use]
    pub fn validate_for_version(&self, version: PactSpecVersion) -> Vec<String> {
        self.rules
            .iter()
            .flat_map(|(key, list)| {
                list.validate_for_version(version)
                    .into_iter()
                    .map(move |err| format!("{}[{key}]: {err}", self.name))
            })
            .collect()
    }

    fn to_v3_json(&self) -> Value {
        if self.name == PATH {
            if let Some(list) = self.rules.get("").or_else(|| self.rules.values().next()) {
                return list.to_json();
            }
        }
        Value::Object(
            self.rules
                .iter()
                .filter(|(_, list)| !list.is_empty())
                .map(|(key, list)| (key.clone(), list.to_json()))
                .collect(),
        )
    }

    fn from_v3_json(name: &str, json: &Value) -> PactResult<Self> {
        let mut category = Self::new(name);
        if name == PATH && json.get("matchers").is_some() {
            category.rules.insert(String::new(), RuleList::from_json(json)?);
            return Ok(category);
        }
        let Some(map) = json.as_object() else {
            return Err(PactError::invalid_pact(format!(
                "Matching rules for category '{name}' must be an object"
            )));
        };
        for (key, value) in map {
            if name == BODY {
                DocPath::parse(key)?;
            }
            category.rules.insert(key.clone(), RuleList::from_json(value)?);
        }
        Ok(category)
    }
}

/// All matching rules of an HTTP part or message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchingRules {
    /// Categories by name
    pub rules: BTreeMap<String, Category>,
}

impl MatchingRules {
    /// Create an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no category holds any rule.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.values().all(Category::is_empty)
    }

    /// Get or create a category.
    pub fn add_category(&mut self, name: &str) -> &mut Category {
        self.rules
            .entry(name.to_string())
            .or_insert_with(|| Category::new(name))
    }

    /// The rules of a category.
    #[must_use]
    pub fn rules_for_category(&self, name: &str) -> Option<&Category> {
        self.rules.get(name)
    }

    /// Rules of a category at an exact key.
    #[must_use]
    pub fn rules_for(&self, category: &str, key: &str) -> Option<&RuleList> {
        self.rules.get(category)?.rules_for(key)
    }

    /// A category, or an empty one when none is declared.
    #[must_use]
    pub fn category_or_empty(&self, name: &str) -> Category {
        self.rules.get(name).cloned().unwrap_or_else(|| Category::new(name))
    }

    /// Ordered merge: later sources override earlier ones per path.
    pub fn merge(&mut self, other: &Self) {
        for (name, category) in &other.rules {
            self.add_category(name).merge(category);
        }
    }

    /// Problems with using these rules in a document of the given version.
    #[must_use]
    pub fn validate_for_version(&self, version: PactSpecVersion) -> Vec<String> {
        self.rules
            .values()
            .flat_map(|category| category.validate_for_version(version))
            .collect()
    }

    /// Render the rules for a document of the given version.
    #[must_use]
    pub fn to_json(&self, version: PactSpecVersion) -> Value {
        if version >= PactSpecVersion::V3 {
            return Value::Object(
                self.rules
                    .iter()
                    .filter(|(_, category)| !category.is_empty())
                    .map(|(name, category)| (name.clone(), category.to_v3_json()))
                    .collect(),
            );
        }

        let mut map = Map::new();
        for (name, category) in &self.rules {
            for (key, list) in &category.rules {
                let Some(first) = list.rules.first() else {
                    continue;
                };
                if list.rules.len() > 1 {
                    warn!(category = %name, key, "V2 documents hold one rule per path, extra rules dropped");
                }
                map.insert(v2_key(name, key), first.to_json());
            }
        }
        Value::Object(map)
    }

    /// Parse the `matchingRules` of a document, in either the V2 flattened
    /// form or the V3 category form.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown matchers or malformed rule definitions.
    pub fn from_json(json: &Value) -> PactResult<Self> {
        let Some(map) = json.as_object() else {
            return Err(PactError::invalid_pact("matchingRules must be a JSON object"));
        };

        let mut rules = Self::new();
        for (key, value) in map {
            if key.starts_with('$') {
                let (category, path) = from_v2_key(key)?;
                let list = RuleList::from_json(value)?;
                rules.add_category(&category).rules.insert(path, list);
            } else {
                let category = Category::from_v3_json(key, value)?;
                rules.add_category(key).merge(&category);
            }
        }
        Ok(rules)
    }
}

fn v2_key(category: &str, key: &str) -> String {
    match category {
        BODY => format!("$.body{}", key.strip_prefix('$').unwrap_or(key)),
        HEADER => format!("$.headers.{key}"),
        PATH => "$.path".to_string(),
        other => format!("$.{other}.{key}"),
    }
}

fn from_v2_key(key: &str) -> PactResult<(String, String)> {
    if let Some(rest) = key.strip_prefix("$.body") {
        let path = format!("${rest}");
        DocPath::parse(&path)?;
        return Ok((BODY.to_string(), path));
    }
    if key == "$.path" {
        return Ok((PATH.to_string(), String::new()));
    }
    if let Some(name) = key.strip_prefix("$.headers.") {
        return Ok((HEADER.to_string(), name.to_string()));
    }
    if let Some(name) = key.strip_prefix("$.query.") {
        return Ok((QUERY.to_string(), name.to_string()));
    }
    if let Some(rest) = key.strip_prefix("$.") {
        if let Some((category, name)) = rest.split_once('.') {
            return Ok((category.to_string(), name.to_string()));
        }
    }
    Err(PactError::invalid_pact(format!(
        "Matching rule path '{key}' does not name a category"
    )))
}

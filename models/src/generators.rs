//! Generators: rules producing concrete values for a location when an
//! interaction is replayed.
//!
//! Generated values are never persisted; a pact only stores the generator
//! definitions, and every application builds its own random source from the
//! [`GeneratorContext`].

use crate::date_format::{
    DEFAULT_DATE_FORMAT, DEFAULT_DATETIME_FORMAT, DEFAULT_TIME_FORMAT, to_chrono_format,
};
use crate::headers::json_to_string;
use crate::path_exp::{DocPath, PathToken};
use crate::spec_version::PactSpecVersion;
use chrono::{DateTime, Utc};
use pact_common::{PactError, PactResult};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use regex::Regex;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use tracing::{debug, warn};

/// Part of an interaction a generator applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeneratorCategory {
    /// Request method
    Method,
    /// Request path
    Path,
    /// Headers, keyed by name
    Header,
    /// Query parameters, keyed by name
    Query,
    /// Body or message contents, keyed by path expression
    Body,
    /// Response status
    Status,
    /// Message metadata, keyed by name
    Metadata,
}

impl GeneratorCategory {
    /// Name used in pact documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::Path => "path",
            Self::Header => "header",
            Self::Query => "query",
            Self::Body => "body",
            Self::Status => "status",
            Self::Metadata => "metadata",
        }
    }

    /// Parse a category name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "method" => Some(Self::Method),
            "path" => Some(Self::Path),
            "header" | "headers" => Some(Self::Header),
            "query" => Some(Self::Query),
            "body" | "content" => Some(Self::Body),
            "status" => Some(Self::Status),
            "metadata" => Some(Self::Metadata),
            _ => None,
        }
    }

    /// Categories that hold a single value rather than a keyed map.
    #[must_use]
    pub const fn is_single_valued(self) -> bool {
        matches!(self, Self::Method | Self::Path | Self::Status)
    }
}

impl fmt::Display for GeneratorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the contract is generating values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeneratorTestMode {
    /// Consumer tests against a mock provider
    #[default]
    Consumer,
    /// Provider verification
    Provider,
}

/// Target type of a provider state value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Render as a string
    String,
    /// Convert to an integer
    Integer,
    /// Convert to a decimal number
    Decimal,
    /// Convert to a boolean
    Boolean,
    /// Keep the value as resolved
    Raw,
}

impl DataType {
    fn parse(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "STRING" => Some(Self::String),
            "INTEGER" => Some(Self::Integer),
            "DECIMAL" | "FLOAT" => Some(Self::Decimal),
            "BOOLEAN" => Some(Self::Boolean),
            "RAW" => Some(Self::Raw),
            _ => None,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Integer => "INTEGER",
            Self::Decimal => "DECIMAL",
            Self::Boolean => "BOOLEAN",
            Self::Raw => "RAW",
        }
    }

    fn convert(self, value: Value) -> PactResult<Value> {
        let converted = match (self, &value) {
            (Self::Raw, _) => Some(value.clone()),
            (Self::String, v) => Some(Value::String(json_to_string(v))),
            (Self::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Some(value.clone()),
            (Self::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
            (Self::Decimal, Value::Number(n)) => n.as_f64().map(Value::from),
            (Self::Decimal, Value::String(s)) => s.trim().parse::<f64>().ok().map(Value::from),
            (Self::Boolean, Value::Bool(_)) => Some(value.clone()),
            (Self::Boolean, Value::String(s)) => s.trim().parse::<bool>().ok().map(Value::Bool),
            _ => None,
        };
        converted.ok_or_else(|| {
            PactError::generator(format!("cannot convert {value} to {}", self.as_str()))
        })
    }
}

/// A value generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generator {
    /// Random integer in the inclusive range
    RandomInt(i64, i64),
    /// Random decimal number with the number of digits
    RandomDecimal(usize),
    /// Random hexadecimal string with the number of digits
    RandomHexadecimal(usize),
    /// Random alphanumeric string of the size
    RandomString(usize),
    /// Random boolean
    RandomBoolean,
    /// Random UUID
    Uuid,
    /// Current date in the format
    Date(Option<String>),
    /// Current time in the format
    Time(Option<String>),
    /// Current date and time in the format
    DateTime(Option<String>),
    /// Value looked up from the provider state parameters
    ProviderState(String, Option<DataType>),
    /// URL rewritten to point at the running mock server
    MockServerUrl(String, String),
    /// Applies the inner generator to every key of a map (V4)
    EachKey(Box<Generator>),
    /// Applies the inner generator to every value of a map or array (V4)
    EachValue(Box<Generator>),
}

impl Generator {
    /// Parse a generator definition.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::UnsupportedMatcher`] for unknown generator types
    /// and [`PactError::InvalidPact`] when the definition is malformed.
    pub fn from_json(json: &Value) -> PactResult<Self> {
        let Some(map) = json.as_object() else {
            return Err(PactError::invalid_pact(format!("Generator must be an object, got {json}")));
        };
        let Some(gen_type) = map.get("type").and_then(Value::as_str) else {
            return Err(PactError::invalid_pact("Generator definition has no type"));
        };

        let generator = match gen_type {
            "RandomInt" => Self::RandomInt(
                i64_field(map, "min").unwrap_or(0),
                i64_field(map, "max").unwrap_or(i64::from(i32::MAX)),
            ),
            "RandomDecimal" => Self::RandomDecimal(usize_field(map, "digits").unwrap_or(10)),
            "RandomHexadecimal" => Self::RandomHexadecimal(usize_field(map, "digits").unwrap_or(10)),
            "RandomString" => Self::RandomString(usize_field(map, "size").unwrap_or(10)),
            "RandomBoolean" => Self::RandomBoolean,
            "Uuid" => Self::Uuid,
            "Date" => Self::Date(str_field(map, "format")),
            "Time" => Self::Time(str_field(map, "format")),
            "DateTime" | "Timestamp" => Self::DateTime(str_field(map, "format")),
            "ProviderState" => Self::ProviderState(
                str_field(map, "expression")
                    .ok_or_else(|| PactError::invalid_pact("ProviderState generator has no expression"))?,
                map.get("dataType").and_then(Value::as_str).and_then(DataType::parse),
            ),
            "MockServerURL" => Self::MockServerUrl(
                str_field(map, "example").unwrap_or_default(),
                str_field(map, "regex").unwrap_or_default(),
            ),
            "EachKey" | "EachValue" => {
                let inner = map
                    .get("generator")
                    .ok_or_else(|| PactError::invalid_pact(format!("{gen_type} generator has no inner generator")))?;
                let inner = Box::new(Self::from_json(inner)?);
                if gen_type == "EachKey" {
                    Self::EachKey(inner)
                } else {
                    Self::EachValue(inner)
                }
            }
            other => return Err(PactError::unsupported_matcher(other)),
        };
        Ok(generator)
    }

    /// Render the generator definition.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::RandomInt(min, max) => json!({"type": "RandomInt", "min": min, "max": max}),
            Self::RandomDecimal(digits) => json!({"type": "RandomDecimal", "digits": digits}),
            Self::RandomHexadecimal(digits) => json!({"type": "RandomHexadecimal", "digits": digits}),
            Self::RandomString(size) => json!({"type": "RandomString", "size": size}),
            Self::RandomBoolean => json!({"type": "RandomBoolean"}),
            Self::Uuid => json!({"type": "Uuid"}),
            Self::Date(format) => with_format("Date", format.as_deref()),
            Self::Time(format) => with_format("Time", format.as_deref()),
            Self::DateTime(format) => with_format("DateTime", format.as_deref()),
            Self::ProviderState(expression, data_type) => match data_type {
                Some(dt) => json!({"type": "ProviderState", "expression": expression, "dataType": dt.as_str()}),
                None => json!({"type": "ProviderState", "expression": expression}),
            },
            Self::MockServerUrl(example, regex) => {
                json!({"type": "MockServerURL", "example": example, "regex": regex})
            }
            Self::EachKey(inner) => json!({"type": "EachKey", "generator": inner.to_json()}),
            Self::EachValue(inner) => json!({"type": "EachValue", "generator": inner.to_json()}),
        }
    }

    /// Problems with using this generator in a document of the given version.
    #[must_use]
    pub fn validate_for_version(&self, version: PactSpecVersion) -> Vec<String> {
        let name = self.to_json()["type"].as_str().unwrap_or_default().to_string();
        match self {
            Self::EachKey(_) | Self::EachValue(_) if version < PactSpecVersion::V4 => {
                vec![format!("{name} generators can only be used with Pact specification versions >= V4")]
            }
            _ if version < PactSpecVersion::V3 => {
                vec![format!("{name} generators can only be used with Pact specification versions >= V3")]
            }
            _ => Vec::new(),
        }
    }

    /// Produce a replacement for the current value.
    ///
    /// Returns `None` when the generator does not run in the context's mode
    /// (provider state lookups only run during provider verification, mock
    /// server URLs only in consumer tests).
    ///
    /// # Errors
    ///
    /// Returns [`PactError::ProviderStateValueNotFound`] when a provider state
    /// expression names a missing parameter, and [`PactError::Generator`] when
    /// a value cannot be produced.
    pub fn generate(
        &self,
        current: &Value,
        context: &GeneratorContext,
        rng: &mut StdRng,
    ) -> PactResult<Option<Value>> {
        let value = match self {
            Self::RandomInt(min, max) => {
                if min > max {
                    return Err(PactError::generator(format!("RandomInt min {min} is greater than max {max}")));
                }
                Value::from(rng.gen_range(*min..=*max))
            }
            Self::RandomDecimal(digits) => random_decimal(*digits, rng)?,
            Self::RandomHexadecimal(digits) => Value::String(
                (0..*digits)
                    .map(|_| char::from(b"0123456789abcdef"[rng.gen_range(0..16)]))
                    .collect(),
            ),
            Self::RandomString(size) => Value::String(
                (0..*size).map(|_| char::from(rng.sample(Alphanumeric))).collect(),
            ),
            Self::RandomBoolean => Value::Bool(rng.gen_bool(0.5)),
            Self::Uuid => {
                let mut bytes = [0u8; 16];
                rng.fill(&mut bytes);
                Value::String(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
            }
            Self::Date(format) => format_now(context, format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT))?,
            Self::Time(format) => format_now(context, format.as_deref().unwrap_or(DEFAULT_TIME_FORMAT))?,
            Self::DateTime(format) => {
                format_now(context, format.as_deref().unwrap_or(DEFAULT_DATETIME_FORMAT))?
            }
            Self::ProviderState(expression, data_type) => {
                if context.mode != GeneratorTestMode::Provider {
                    return Ok(None);
                }
                let resolved = resolve_expression(expression, &context.provider_state)?;
                match data_type {
                    Some(dt) => dt.convert(resolved)?,
                    None => resolved,
                }
            }
            Self::MockServerUrl(example, regex) => {
                if context.mode != GeneratorTestMode::Consumer {
                    return Ok(None);
                }
                let Some(base) = &context.mock_server_url else {
                    return Ok(None);
                };
                let re = Regex::new(regex)
                    .map_err(|err| PactError::generator(format!("invalid MockServerURL regex '{regex}': {err}")))?;
                let Some(suffix) = re.captures(example).and_then(|caps| caps.get(1)) else {
                    warn!(example, regex, "MockServerURL regex did not match the example URL");
                    return Ok(None);
                };
                Value::String(format!("{}{}", base.trim_end_matches('/'), suffix.as_str()))
            }
            Self::EachKey(inner) | Self::EachValue(inner) => return inner.generate(current, context, rng),
        };
        Ok(Some(value))
    }

    /// Replace a value in place, descending into maps and arrays for the
    /// each-key and each-value generators.
    ///
    /// # Errors
    ///
    /// Propagates generation errors.
    pub fn apply_in_place(
        &self,
        value: &mut Value,
        context: &GeneratorContext,
        rng: &mut StdRng,
    ) -> PactResult<()> {
        match (self, value) {
            (Self::EachKey(inner), Value::Object(map)) => {
                let mut renamed = Map::new();
                for (key, child) in std::mem::take(map) {
                    let new_key = match inner.generate(&Value::String(key.clone()), context, rng)? {
                        Some(generated) => json_to_string(&generated),
                        None => key,
                    };
                    renamed.insert(new_key, child);
                }
                *map = renamed;
            }
            (Self::EachValue(inner), Value::Object(map)) => {
                for child in map.values_mut() {
                    inner.apply_in_place(child, context, rng)?;
                }
            }
            (Self::EachValue(inner), Value::Array(items)) => {
                for child in items {
                    inner.apply_in_place(child, context, rng)?;
                }
            }
            (generator, value) => {
                if let Some(generated) = generator.generate(value, context, rng)? {
                    *value = generated;
                }
            }
        }
        Ok(())
    }
}

fn str_field(map: &Map<String, Value>, field: &str) -> Option<String> {
    map.get(field).and_then(Value::as_str).map(str::to_string)
}

fn i64_field(map: &Map<String, Value>, field: &str) -> Option<i64> {
    match map.get(field)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn usize_field(map: &Map<String, Value>, field: &str) -> Option<usize> {
    i64_field(map, field).and_then(|n| usize::try_from(n).ok())
}

fn with_format(gen_type: &str, format: Option<&str>) -> Value {
    match format {
        Some(format) => json!({"type": gen_type, "format": format}),
        None => json!({"type": gen_type}),
    }
}

fn random_decimal(digits: usize, rng: &mut StdRng) -> PactResult<Value> {
    if digits == 0 {
        return Err(PactError::generator("RandomDecimal needs at least one digit"));
    }
    let mut text: String = std::iter::once(char::from(b'0' + rng.gen_range(1..10u8)))
        .chain((1..digits).map(|_| char::from(b'0' + rng.gen_range(0..10u8))))
        .collect();
    if digits > 1 {
        text.insert(rng.gen_range(1..digits), '.');
    }
    let number: f64 = text
        .parse()
        .map_err(|err| PactError::generator(format!("generated invalid decimal '{text}': {err}")))?;
    Ok(Value::from(number))
}

fn format_now(context: &GeneratorContext, pattern: &str) -> PactResult<Value> {
    let now = context.now.unwrap_or_else(Utc::now);
    let mut out = String::new();
    write!(out, "{}", now.format(&to_chrono_format(pattern)))
        .map_err(|_| PactError::generator(format!("invalid date/time format '{pattern}'")))?;
    Ok(Value::String(out))
}

/// Resolve a provider state expression such as `${orderId}` or
/// `/orders/${orderId}`. A bare expression without placeholders is a key.
fn resolve_expression(expression: &str, params: &BTreeMap<String, Value>) -> PactResult<Value> {
    let lookup = |key: &str| {
        params
            .get(key)
            .cloned()
            .ok_or_else(|| PactError::ProviderStateValueNotFound { key: key.to_string() })
    };

    let trimmed = expression.trim();
    if !trimmed.contains("${") {
        return lookup(trimmed);
    }
    if let Some(key) = trimmed.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
        if !key.contains("${") && !key.contains('}') {
            return lookup(key);
        }
    }

    let mut out = String::new();
    let mut rest = expression;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(PactError::generator(format!("unterminated expression in '{expression}'")));
        };
        out.push_str(&json_to_string(&lookup(&after[..end])?));
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(Value::String(out))
}

/// Inputs for generating values.
#[derive(Debug, Clone, Default)]
pub struct GeneratorContext {
    /// Consumer or provider side
    pub mode: GeneratorTestMode,
    /// Parameters of the active provider states
    pub provider_state: BTreeMap<String, Value>,
    /// Base URL of the running mock server
    pub mock_server_url: Option<String>,
    /// Seed for reproducible random values
    pub seed: Option<u64>,
    /// Fixed current time for reproducible date values
    pub now: Option<DateTime<Utc>>,
}

impl GeneratorContext {
    /// Context for consumer tests.
    #[must_use]
    pub fn consumer() -> Self {
        Self::default()
    }

    /// Context for provider verification with the active state parameters.
    #[must_use]
    pub fn provider(provider_state: BTreeMap<String, Value>) -> Self {
        Self {
            mode: GeneratorTestMode::Provider,
            provider_state,
            ..Self::default()
        }
    }

    /// Set the mock server URL.
    #[must_use]
    pub fn with_mock_server_url(mut self, url: impl Into<String>) -> Self {
        self.mock_server_url = Some(url.into());
        self
    }

    /// Seed the random source.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fix the current time.
    #[must_use]
    pub const fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// A fresh random source for one application.
    #[must_use]
    pub fn rng(&self) -> StdRng {
        self.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
    }
}

/// Generators of an HTTP part or message, by category and key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Generators {
    /// Generators per category; single valued categories use the empty key
    pub categories: BTreeMap<GeneratorCategory, BTreeMap<String, Generator>>,
}

impl Generators {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no generator is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.values().all(BTreeMap::is_empty)
    }

    /// Add a generator at a key (empty for method, path and status).
    pub fn add_generator(&mut self, category: GeneratorCategory, key: impl Into<String>, generator: Generator) {
        self.categories
            .entry(category)
            .or_default()
            .insert(key.into(), generator);
    }

    /// Generators of one category.
    #[must_use]
    pub fn category(&self, category: GeneratorCategory) -> Option<&BTreeMap<String, Generator>> {
        self.categories.get(&category)
    }

    /// Ordered merge: later generators override earlier ones per key.
    pub fn merge(&mut self, other: &Self) {
        for (category, generators) in &other.categories {
            let target = self.categories.entry(*category).or_default();
            for (key, generator) in generators {
                target.insert(key.clone(), generator.clone());
            }
        }
    }

    /// Problems with using these generators in a document of the given version.
    #[must_use]
    pub fn validate_for_version(&self, version: PactSpecVersion) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|(category, generators)| {
                generators.iter().flat_map(move |(key, generator)| {
                    generator
                        .validate_for_version(version)
                        .into_iter()
                        .map(move |err| format!("{category}[{key}]: {err}"))
                })
            })
            .collect()
    }

    /// Parse the `generators` of a document.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown generator types or malformed definitions.
    pub fn from_json(json: &Value) -> PactResult<Self> {
        let Some(map) = json.as_object() else {
            return Err(PactError::invalid_pact("generators must be a JSON object"));
        };
        let mut generators = Self::new();
        for (name, value) in map {
            let Some(category) = GeneratorCategory::parse(name) else {
                warn!(category = %name, "ignoring generators for unknown category");
                continue;
            };
            if category.is_single_valued() && value.get("type").is_some() {
                generators.add_generator(category, "", Generator::from_json(value)?);
                continue;
            }
            let Some(entries) = value.as_object() else {
                return Err(PactError::invalid_pact(format!("generators for '{name}' must be an object")));
            };
            for (key, definition) in entries {
                if category == GeneratorCategory::Body {
                    DocPath::parse(key)?;
                }
                generators.add_generator(category, key.clone(), Generator::from_json(definition)?);
            }
        }
        Ok(generators)
    }

    /// Render the generators; nothing is written before V3.
    #[must_use]
    pub fn to_json(&self, version: PactSpecVersion) -> Option<Value> {
        if version < PactSpecVersion::V3 || self.is_empty() {
            return None;
        }
        let map: Map<String, Value> = self
            .categories
            .iter()
            .filter(|(_, generators)| !generators.is_empty())
            .map(|(category, generators)| {
                let value = match generators.get("") {
                    Some(generator) if category.is_single_valued() => generator.to_json(),
                    _ => Value::Object(
                        generators
                            .iter()
                            .map(|(key, generator)| (key.clone(), generator.to_json()))
                            .collect(),
                    ),
                };
                (category.as_str().to_string(), value)
            })
            .collect();
        Some(Value::Object(map))
    }

    /// Generate a replacement value for every key of a category.
    ///
    /// Keyed categories produce one entry per header, parameter or path
    /// expression; single valued categories use the empty key.
    ///
    /// # Errors
    ///
    /// Propagates generation errors; a missing provider state value is fatal.
    pub fn apply(
        &self,
        category: GeneratorCategory,
        context: &GeneratorContext,
    ) -> PactResult<BTreeMap<String, Value>> {
        let mut rng = context.rng();
        let mut values = BTreeMap::new();
        for (key, generator) in self.categories.get(&category).into_iter().flatten() {
            if let Some(value) = generator.generate(&Value::Null, context, &mut rng)? {
                debug!(%category, key, "generated value");
                values.insert(key.clone(), value);
            }
        }
        Ok(values)
    }

    /// Apply the body generators to a JSON document in place.
    ///
    /// Each path expression is resolved against the document; wildcards
    /// apply the generator to every matching location and expressions with
    /// no matching location are skipped.
    ///
    /// # Errors
    ///
    /// Propagates generation errors.
    pub fn apply_to_json(&self, body: &mut Value, context: &GeneratorContext) -> PactResult<()> {
        self.apply_to_json_category(GeneratorCategory::Body, body, context)
    }

    /// Apply the generators of a path-keyed category to a JSON document.
    ///
    /// # Errors
    ///
    /// Propagates generation errors.
    pub fn apply_to_json_category(
        &self,
        category: GeneratorCategory,
        document: &mut Value,
        context: &GeneratorContext,
    ) -> PactResult<()> {
        let mut rng = context.rng();
        for (key, generator) in self.categories.get(&category).into_iter().flatten() {
            let path = DocPath::parse(key)?;
            apply_at_path(document, path.tokens(), &mut |value| {
                generator.apply_in_place(value, context, &mut rng)
            })?;
        }
        Ok(())
    }
}

fn apply_at_path(
    value: &mut Value,
    tokens: &[PathToken],
    apply: &mut dyn FnMut(&mut Value) -> PactResult<()>,
) -> PactResult<()> {
    let Some((token, rest)) = tokens.split_first() else {
        return apply(value);
    };
    match (token, value) {
        (PathToken::Root, value) => apply_at_path(value, rest, apply),
        (PathToken::Field(name), Value::Object(map)) => match map.get_mut(name) {
            Some(child) => apply_at_path(child, rest, apply),
            None => Ok(()),
        },
        (PathToken::Index(index), Value::Array(items)) => match items.get_mut(*index) {
            Some(child) => apply_at_path(child, rest, apply),
            None => Ok(()),
        },
        (PathToken::Star, Value::Object(map)) => {
            for child in map.values_mut() {
                apply_at_path(child, rest, apply)?;
            }
            Ok(())
        }
        (PathToken::Star | PathToken::StarIndex, Value::Array(items)) => {
            for child in items {
                apply_at_path(child, rest, apply)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn provider_context(params: &[(&str, Value)]) -> GeneratorContext {
        GeneratorContext::provider(params.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect())
    }

    #[test]
    fn test_json_round_trip() {
        let generators = vec![
            Generator::RandomInt(1, 5),
            Generator::RandomString(8),
            Generator::Date(Some("yyyy-MM-dd".to_string())),
            Generator::ProviderState("${id}".to_string(), Some(DataType::Integer)),
            Generator::MockServerUrl("http://localhost:1234/orders/1".to_string(), ".*(/orders/\\d+)$".to_string()),
            Generator::EachValue(Box::new(Generator::Uuid)),
        ];
        for generator in generators {
            assert_eq!(Generator::from_json(&generator.to_json()).unwrap(), generator);
        }
    }

    #[test]
    fn test_unknown_generator_type() {
        let err = Generator::from_json(&json!({"type": "Regex", "regex": "\\d+"})).unwrap_err();
        assert!(matches!(err, PactError::UnsupportedMatcher { name } if name == "Regex"));
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let context = GeneratorContext::consumer().with_seed(42);
        let generator = Generator::RandomString(16);
        let a = generator.generate(&Value::Null, &context, &mut context.rng()).unwrap();
        let b = generator.generate(&Value::Null, &context, &mut context.rng()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.unwrap().as_str().unwrap().len(), 16);
    }

    #[test]
    fn test_random_int_in_range() {
        let context = GeneratorContext::consumer();
        let mut rng = context.rng();
        for _ in 0..50 {
            let value = Generator::RandomInt(3, 7).generate(&Value::Null, &context, &mut rng).unwrap().unwrap();
            let n = value.as_i64().unwrap();
            assert!((3..=7).contains(&n));
        }
    }

    #[test]
    fn test_date_uses_fixed_now() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap();
        let context = GeneratorContext::consumer().with_now(now);
        let mut rng = context.rng();
        let date = Generator::Date(None).generate(&Value::Null, &context, &mut rng).unwrap();
        assert_eq!(date, Some(json!("2024-03-01")));
        let ts = Generator::DateTime(Some("yyyy-MM-dd'T'HH:mm:ss".to_string()))
            .generate(&Value::Null, &context, &mut rng)
            .unwrap();
        assert_eq!(ts, Some(json!("2024-03-01T14:05:09")));
    }

    #[test]
    fn test_provider_state_lookup() {
        let context = provider_context(&[("orderId", json!(42))]);
        let mut rng = context.rng();
        let value = Generator::ProviderState("${orderId}".to_string(), None)
            .generate(&Value::Null, &context, &mut rng)
            .unwrap();
        assert_eq!(value, Some(json!(42)));

        let path = Generator::ProviderState("/orders/${orderId}".to_string(), None)
            .generate(&Value::Null, &context, &mut rng)
            .unwrap();
        assert_eq!(path, Some(json!("/orders/42")));
    }

    #[test]
    fn test_missing_provider_state_value_is_fatal() {
        let context = provider_context(&[]);
        let err = Generator::ProviderState("${orderId}".to_string(), None)
            .generate(&Value::Null, &context, &mut context.rng())
            .unwrap_err();
        assert!(matches!(&err, PactError::ProviderStateValueNotFound { key } if key == "orderId"));
        assert!(err.is_fatal_for_interaction());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_mode_gating() {
        let consumer = GeneratorContext::consumer();
        let state = Generator::ProviderState("${id}".to_string(), None);
        assert_eq!(state.generate(&Value::Null, &consumer, &mut consumer.rng()).unwrap(), None);

        let url = Generator::MockServerUrl("http://localhost:1234/a/1".to_string(), ".*(/a/\\d+)$".to_string());
        let with_url = GeneratorContext::consumer().with_mock_server_url("http://127.0.0.1:9999/");
        assert_eq!(
            url.generate(&Value::Null, &with_url, &mut with_url.rng()).unwrap(),
            Some(json!("http://127.0.0.1:9999/a/1"))
        );
        let provider = provider_context(&[]);
        assert_eq!(url.generate(&Value::Null, &provider, &mut provider.rng()).unwrap(), None);
    }

    #[test]
    fn test_apply_to_json_with_wildcards() {
        let mut generators = Generators::new();
        generators.add_generator(GeneratorCategory::Body, "$.items[*].id", Generator::ProviderState("id".to_string(), None));
        generators.add_generator(GeneratorCategory::Body, "$.missing", Generator::Uuid);

        let mut body = json!({"items": [{"id": 1}, {"id": 2}], "name": "x"});
        let context = provider_context(&[("id", json!(7))]);
        generators.apply_to_json(&mut body, &context).unwrap();
        assert_eq!(body, json!({"items": [{"id": 7}, {"id": 7}], "name": "x"}));
    }

    #[test]
    fn test_generators_document_form() {
        let mut generators = Generators::new();
        generators.add_generator(GeneratorCategory::Path, "", Generator::ProviderState("/orders/${id}".to_string(), None));
        generators.add_generator(GeneratorCategory::Header, "X-Request-Id", Generator::Uuid);
        let json = generators.to_json(PactSpecVersion::V3).unwrap();
        assert_eq!(
            json,
            json!({
                "path": {"type": "ProviderState", "expression": "/orders/${id}"},
                "header": {"X-Request-Id": {"type": "Uuid"}}
            })
        );
        assert_eq!(Generators::from_json(&json).unwrap(), generators);
        assert!(generators.to_json(PactSpecVersion::V2).is_none());
    }

    #[test]
    fn test_each_key_requires_v4() {
        let mut generators = Generators::new();
        generators.add_generator(GeneratorCategory::Body, "$.map", Generator::EachKey(Box::new(Generator::Uuid)));
        assert_eq!(generators.validate_for_version(PactSpecVersion::V3).len(), 1);
        assert!(generators.validate_for_version(PactSpecVersion::V4).is_empty());
    }
}

//! Content type to body matcher registry.
//!
//! The default table is built once and never mutated. Callers that need a
//! different matcher for a content type layer overrides on a
//! [`MatchingConfig`], which is consulted before the defaults.

use once_cell::sync::Lazy;
use pact_common::{PactError, PactResult};
use pact_models::ContentType;
use regex::Regex;
use std::fmt;
use tracing::debug;

/// The body comparison strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyMatcherKind {
    /// Structural JSON comparison
    Json,
    /// JSON preceded by a 5 byte schema registry header
    KafkaJsonSchema,
    /// Structural XML comparison
    Xml,
    /// Whole-body text comparison
    PlainText,
    /// `application/x-www-form-urlencoded` parameters
    FormUrlEncoded,
    /// Multipart parts compared by name
    Multipart,
}

impl BodyMatcherKind {
    /// Resolve a matcher identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::UnsupportedMatcher`] for unknown identifiers.
    pub fn from_id(id: &str) -> PactResult<Self> {
        match id.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "kafka-json-schema" | "kafka" => Ok(Self::KafkaJsonSchema),
            "xml" => Ok(Self::Xml),
            "text" | "plain-text" => Ok(Self::PlainText),
            "form" | "form-urlencoded" => Ok(Self::FormUrlEncoded),
            "multipart" => Ok(Self::Multipart),
            _ => Err(PactError::unsupported_matcher(id)),
        }
    }

    /// Identifier of the matcher.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::KafkaJsonSchema => "kafka-json-schema",
            Self::Xml => "xml",
            Self::PlainText => "text",
            Self::FormUrlEncoded => "form-urlencoded",
            Self::Multipart => "multipart",
        }
    }
}

impl fmt::Display for BodyMatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

const DEFAULT_PATTERNS: &[(&str, BodyMatcherKind)] = &[
    (r"application/vnd\.schemaregistry\.v1\+json", BodyMatcherKind::KafkaJsonSchema),
    (r"application/.*xml", BodyMatcherKind::Xml),
    (r"text/xml", BodyMatcherKind::Xml),
    (r".*json.*", BodyMatcherKind::Json),
    (r"text/plain", BodyMatcherKind::PlainText),
    (r"multipart/form-data", BodyMatcherKind::Multipart),
    (r"multipart/mixed", BodyMatcherKind::Multipart),
    (r"application/x-www-form-urlencoded", BodyMatcherKind::FormUrlEncoded),
];

static DEFAULT_BODY_MATCHERS: Lazy<Vec<(Regex, BodyMatcherKind)>> = Lazy::new(|| {
    DEFAULT_PATTERNS
        .iter()
        .filter_map(|(pattern, kind)| full_match_regex(pattern).ok().map(|re| (re, *kind)))
        .collect()
});

fn full_match_regex(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{pattern})$"))
}

/// How unexpected map keys are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffConfig {
    /// Keys in the actual value that are not expected are ignored
    #[default]
    AllowUnexpectedKeys,
    /// Keys in the actual value that are not expected are mismatches
    NoUnexpectedKeys,
}

/// Matching configuration: key strictness and body matcher overrides.
#[derive(Debug, Clone, Default)]
pub struct MatchingConfig {
    /// Strictness for unexpected keys
    pub diff_config: DiffConfig,
    overrides: Vec<(Regex, BodyMatcherKind)>,
}

impl MatchingConfig {
    /// Create a configuration with the default matchers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strictness for unexpected keys.
    #[must_use]
    pub const fn with_diff_config(mut self, diff_config: DiffConfig) -> Self {
        self.diff_config = diff_config;
        self
    }

    /// Route content types matching `pattern` to the matcher named `id`.
    ///
    /// Overrides are consulted in the order they were added, before the
    /// default table.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::UnsupportedMatcher`] for unknown matcher ids and
    /// [`PactError::Config`] for invalid patterns.
    pub fn with_body_matcher(mut self, pattern: &str, id: &str) -> PactResult<Self> {
        let kind = BodyMatcherKind::from_id(id)?;
        let regex = full_match_regex(pattern)
            .map_err(|err| PactError::config(format!("Invalid content type pattern '{pattern}': {err}")))?;
        self.overrides.push((regex, kind));
        Ok(self)
    }

    /// The body matcher for a content type, or `None` when bodies of this
    /// type are compared byte for byte.
    #[must_use]
    pub fn lookup_body_matcher(&self, content_type: &ContentType) -> Option<BodyMatcherKind> {
        let base_type = content_type.base_type();
        let found = self
            .overrides
            .iter()
            .chain(DEFAULT_BODY_MATCHERS.iter())
            .find(|(regex, _)| regex.is_match(&base_type))
            .map(|(_, kind)| *kind)
            .or_else(|| match content_type.semantic_category() {
                "json" => Some(BodyMatcherKind::Json),
                "text" => Some(BodyMatcherKind::PlainText),
                _ => None,
            });
        debug!(content_type = %base_type, matcher = ?found, "resolved body matcher");
        found
    }
}

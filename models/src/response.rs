//! Expected or actual HTTP responses.

use crate::body::OptionalBody;
use crate::generators::Generators;
use crate::headers::{Headers, headers_from_json, headers_to_json};
use crate::http_part::{HttpPart, generators_from_json, matching_rules_from_json};
use crate::matchingrules::MatchingRules;
use crate::spec_version::PactSpecVersion;
use pact_common::{PactError, PactResult};
use serde_json::{Map, Value, json};

/// An HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: u16,
    /// Headers
    pub headers: Headers,
    /// Body
    pub body: OptionalBody,
    /// Matching rules
    pub matching_rules: MatchingRules,
    /// Generators
    pub generators: Generators,
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Headers::new(),
            body: OptionalBody::Missing,
            matching_rules: MatchingRules::new(),
            generators: Generators::new(),
        }
    }
}

impl Response {
    /// Create a response with a status code.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    /// Add a header value.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: OptionalBody) -> Self {
        self.body = body;
        self
    }

    /// Set the matching rules.
    #[must_use]
    pub fn with_matching_rules(mut self, rules: MatchingRules) -> Self {
        self.matching_rules = rules;
        self
    }

    /// Set the generators.
    #[must_use]
    pub fn with_generators(mut self, generators: Generators) -> Self {
        self.generators = generators;
        self
    }

    /// Parse a response from a pact document.
    ///
    /// # Errors
    ///
    /// Returns an error for an out of range status or invalid rules.
    pub fn from_json(json: &Value, version: PactSpecVersion) -> PactResult<Self> {
        let status = match json.get("status") {
            None => 200,
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| u16::try_from(n).ok())
                .ok_or_else(|| PactError::invalid_pact(format!("Invalid response status {n}")))?,
            Some(other) => {
                return Err(PactError::invalid_pact(format!("Response status must be a number, got {other}")));
            }
        };
        let mut response = Self {
            status,
            headers: headers_from_json(json.get("headers")),
            body: OptionalBody::Missing,
            matching_rules: matching_rules_from_json(json)?,
            generators: generators_from_json(json)?,
        };
        response.body = OptionalBody::from_pact_json(json.get("body"), response.content_type_header(), version);
        Ok(response)
    }

    /// Render the response for a pact document.
    #[must_use]
    pub fn to_json(&self, version: PactSpecVersion) -> Value {
        let mut map = Map::new();
        map.insert("status".to_string(), json!(self.status));
        if !self.headers.is_empty() {
            map.insert("headers".to_string(), headers_to_json(&self.headers, version));
        }
        if let Some(body) = self.body.to_json(&self.determine_content_type(), version) {
            map.insert("body".to_string(), body);
        }
        if !self.matching_rules.is_empty() {
            map.insert("matchingRules".to_string(), self.matching_rules.to_json(version));
        }
        if let Some(generators) = self.generators.to_json(version) {
            map.insert("generators".to_string(), generators);
        }
        Value::Object(map)
    }
}

impl HttpPart for Response {
    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    fn body(&self) -> &OptionalBody {
        &self.body
    }

    fn body_mut(&mut self) -> &mut OptionalBody {
        &mut self.body
    }

    fn matching_rules(&self) -> &MatchingRules {
        &self.matching_rules
    }

    fn generators(&self) -> &Generators {
        &self.generators
    }
}

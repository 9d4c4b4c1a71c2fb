//! Expected or actual HTTP requests.

use crate::body::OptionalBody;
use crate::generators::Generators;
use crate::headers::{Headers, QueryParams, headers_from_json, headers_to_json, query_from_json, query_to_json};
use crate::http_part::{HttpPart, generators_from_json, matching_rules_from_json};
use crate::matchingrules::MatchingRules;
use crate::spec_version::PactSpecVersion;
use pact_common::PactResult;
use serde_json::{Map, Value, json};

/// An HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Method, upper case
    pub method: String,
    /// Path
    pub path: String,
    /// Query parameters
    pub query: QueryParams,
    /// Headers
    pub headers: Headers,
    /// Body
    pub body: OptionalBody,
    /// Matching rules
    pub matching_rules: MatchingRules,
    /// Generators
    pub generators: Generators,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            path: "/".to_string(),
            query: QueryParams::new(),
            headers: Headers::new(),
            body: OptionalBody::Missing,
            matching_rules: MatchingRules::new(),
            generators: Generators::new(),
        }
    }
}

impl Request {
    /// Create a request for a method and path.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into().to_uppercase(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Add a query parameter value.
    #[must_use]
    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.entry(name.into()).or_default().push(value.into());
        self
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

    /// Parse a request from a pact document.
    ///
    /// # Errors
    ///
    /// Returns an error when the matching rules or generators are invalid.
    pub fn from_json(json: &Value, version: PactSpecVersion) -> PactResult<Self> {
        let headers = headers_from_json(json.get("headers"));
        let mut request = Self {
            method: json
                .get("method")
                .and_then(Value::as_str)
                .unwrap_or("GET")
                .to_uppercase(),
            path: json.get("path").and_then(Value::as_str).unwrap_or("/").to_string(),
            query: query_from_json(json.get("query")),
            headers,
            body: OptionalBody::Missing,
            matching_rules: matching_rules_from_json(json)?,
            generators: generators_from_json(json)?,
        };
        request.body = OptionalBody::from_pact_json(json.get("body"), request.content_type_header(), version);
        Ok(request)
    }

    /// Render the request for a pact document.
    #[must_use]
    pub fn to_json(&self, version: PactSpecVersion) -> Value {
        let mut map = Map::new();
        map.insert("method".to_string(), json!(self.method.to_uppercase()));
        map.insert("path".to_string(), json!(self.path));
        if !self.query.is_empty() {
            map.insert("query".to_string(), query_to_json(&self.query, version));
        }
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

impl HttpPart for Request {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content_type::ContentType;

    #[test]
    fn test_defaults() {
        let request = Request::from_json(&json!({}), PactSpecVersion::V3).unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.path, "/");
        assert!(request.body.is_missing());
    }

    #[test]
    fn test_header_content_type_wins() {
        let request = Request::new("post", "/orders")
            .with_header("Content-Type", "text/plain; charset=UTF-16")
            .with_body(OptionalBody::present("{}", ContentType::json()));
        assert_eq!(request.method, "POST");
        assert_eq!(request.determine_content_type().base_type(), "text/plain");
        assert_eq!(request.charset().as_deref(), Some("UTF-16"));
    }

    #[test]
    fn test_query_form_per_version() {
        let request = Request::new("GET", "/search").with_query_param("q", "a b");
        assert_eq!(request.to_json(PactSpecVersion::V2)["query"], json!("q=a+b"));
        assert_eq!(request.to_json(PactSpecVersion::V3)["query"], json!({"q": ["a b"]}));
    }

    #[test]
    fn test_round_trip() {
        let json = json!({
            "method": "PUT",
            "path": "/orders/1",
            "query": {"expand": ["items"]},
            "headers": {"Content-Type": "application/json"},
            "body": {"status": "shipped"},
            "matchingRules": {"body": {"$.status": {"matchers": [{"match": "type"}], "combine": "AND"}}}
        });
        let request = Request::from_json(&json, PactSpecVersion::V3).unwrap();
        assert!(request.body.content_type().unwrap().is_json());
        assert_eq!(request.to_json(PactSpecVersion::V3), json);
    }
}

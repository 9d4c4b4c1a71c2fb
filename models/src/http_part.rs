//! Capability shared by requests and responses.

use crate::body::OptionalBody;
use crate::content_type::{ContentType, detect_content_type};
use crate::generators::Generators;
use crate::headers::{Headers, find_header};
use crate::matchingrules::MatchingRules;

/// Headers, body, matching rules and generators of an HTTP request or response.
pub trait HttpPart {
    /// Headers of the part.
    fn headers(&self) -> &Headers;

    /// Mutable headers of the part.
    fn headers_mut(&mut self) -> &mut Headers;

    /// Body of the part.
    fn body(&self) -> &OptionalBody;

    /// Mutable body of the part.
    fn body_mut(&mut self) -> &mut OptionalBody;

    /// Matching rules declared on the part.
    fn matching_rules(&self) -> &MatchingRules;

    /// Generators declared on the part.
    fn generators(&self) -> &Generators;

    /// Values of a header, looked up ignoring case.
    fn lookup_header(&self, name: &str) -> Option<&Vec<String>> {
        find_header(self.headers(), name).map(|(_, values)| values)
    }

    /// Whether the part has a header, ignoring case.
    fn has_header(&self, name: &str) -> bool {
        self.lookup_header(name).is_some()
    }

    /// Content type declared by the `Content-Type` header.
    fn content_type_header(&self) -> Option<ContentType> {
        self.lookup_header("content-type")
            .and_then(|values| values.first())
            .map(|value| ContentType::parse(value))
    }

    /// Content type of the part.
    ///
    /// An explicit `Content-Type` header wins over the content type the body
    /// was declared with; a body without a known content type is sniffed.
    fn determine_content_type(&self) -> ContentType {
        if let Some(ct) = self.content_type_header() {
            return ct;
        }
        match self.body() {
            OptionalBody::Present(_, ct) if !ct.is_unknown() => ct.clone(),
            OptionalBody::Present(bytes, _) if !bytes.is_empty() => detect_content_type(bytes),
            _ => ContentType::unknown(),
        }
    }

    /// Character set of the body, falling back to the `Content-Type` header.
    fn charset(&self) -> Option<String> {
        self.body()
            .content_type()
            .and_then(|ct| ct.charset().map(str::to_string))
            .or_else(|| {
                self.content_type_header()
                    .and_then(|ct| ct.charset().map(str::to_string))
            })
    }
}

/// Read the `matchingRules` of a part or message, if present.
pub(crate) fn matching_rules_from_json(
    json: &serde_json::Value,
) -> pact_common::PactResult<MatchingRules> {
    json.get("matchingRules")
        .map(MatchingRules::from_json)
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Read the `generators` of a part or message, if present.
pub(crate) fn generators_from_json(json: &serde_json::Value) -> pact_common::PactResult<Generators> {
    json.get("generators")
        .map(Generators::from_json)
        .transpose()
        .map(Option::unwrap_or_default)
}

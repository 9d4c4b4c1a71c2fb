//! MIME content types and body content sniffing.

use std::collections::BTreeMap;
use std::fmt;

/// A parsed MIME content type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentType {
    /// Main type, e.g. `application`
    pub main_type: String,
    /// Sub type, e.g. `json`
    pub sub_type: String,
    /// Parameters such as `charset` or `boundary`
    pub attributes: BTreeMap<String, String>,
}

impl ContentType {
    /// Content type used when nothing is known about a body.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            main_type: "*".to_string(),
            sub_type: "*".to_string(),
            attributes: BTreeMap::new(),
        }
    }

    /// `application/json`
    #[must_use]
    pub fn json() -> Self {
        Self::parse("application/json")
    }

    /// `application/xml`
    #[must_use]
    pub fn xml() -> Self {
        Self::parse("application/xml")
    }

    /// `text/plain`
    #[must_use]
    pub fn text_plain() -> Self {
        Self::parse("text/plain")
    }

    /// `application/octet-stream`
    #[must_use]
    pub fn binary() -> Self {
        Self::parse("application/octet-stream")
    }

    /// Parse a content type string. Unparseable input yields [`ContentType::unknown`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut segments = value.split(';');
        let media = segments.next().unwrap_or_default().trim().to_lowercase();
        let Some((main_type, sub_type)) = media.split_once('/') else {
            return Self::unknown();
        };
        if main_type.is_empty() || sub_type.is_empty() {
            return Self::unknown();
        }

        let attributes = segments
            .filter_map(|attr| {
                let (key, val) = attr.split_once('=')?;
                Some((
                    key.trim().to_lowercase(),
                    val.trim().trim_matches('"').to_string(),
                ))
            })
            .collect();

        Self {
            main_type: main_type.to_string(),
            sub_type: sub_type.to_string(),
            attributes,
        }
    }

    /// `type/subtype` without parameters.
    #[must_use]
    pub fn base_type(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Whether nothing is known about this content type.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.main_type == "*"
    }

    /// JSON content, including `+json` suffixes.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.sub_type.contains("json")
    }

    /// XML content, including `+xml` suffixes.
    #[must_use]
    pub fn is_xml(&self) -> bool {
        self.sub_type == "xml" || self.sub_type.ends_with("+xml")
    }

    /// Multipart content.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type == "multipart"
    }

    /// URL encoded form content.
    #[must_use]
    pub fn is_form_urlencoded(&self) -> bool {
        self.base_type() == "application/x-www-form-urlencoded"
    }

    /// Content that can be represented as text.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.main_type == "text"
            || self.is_json()
            || self.is_xml()
            || self.is_form_urlencoded()
            || self.sub_type == "javascript"
    }

    /// Content that must be treated as opaque bytes.
    #[must_use]
    pub fn is_binary(&self) -> bool {
        !self.is_unknown() && !self.is_text() && !self.is_multipart()
    }

    /// The generic category used when no specific body matcher is registered.
    ///
    /// Returns `"json"`, `"text"` or `"binary"`.
    #[must_use]
    pub fn semantic_category(&self) -> &'static str {
        if self.is_json() {
            "json"
        } else if self.is_text() {
            "text"
        } else {
            "binary"
        }
    }

    /// Declared charset, if any.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.attributes.get("charset").map(String::as_str)
    }

    /// Multipart boundary, if any.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.attributes.get("boundary").map(String::as_str)
    }
}

impl Default for ContentType {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;
        for (key, value) in &self.attributes {
            write!(f, "; {key}={value}")?;
        }
        Ok(())
    }
}

/// Guess the content type of a body from its bytes.
#[must_use]
pub fn detect_content_type(data: &[u8]) -> ContentType {
    let Ok(text) = std::str::from_utf8(data) else {
        return ContentType::binary();
    };
    let trimmed = text.trim_start();

    if trimmed.starts_with("<?xml") || (trimmed.starts_with('<') && trimmed.trim_end().ends_with('>')) {
        if trimmed.to_lowercase().starts_with("<!doctype html") || trimmed.to_lowercase().starts_with("<html") {
            return ContentType::parse("text/html");
        }
        return ContentType::xml();
    }
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(text).is_ok()
    {
        return ContentType::json();
    }
    if text.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        return ContentType::binary();
    }
    ContentType::text_plain()
}

//! Optional bodies of requests, responses and messages.

use crate::content_type::{ContentType, detect_content_type};
use crate::spec_version::PactSpecVersion;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};
use tracing::warn;

/// A body that may be absent, explicitly null, or present.
///
/// A present body always carries a content type, which may be
/// [`ContentType::unknown`]. An empty byte vector is the empty body.
#[derive(Debug, Clone, Default)]
pub enum OptionalBody {
    /// No body was specified
    #[default]
    Missing,
    /// The body was explicitly `null`
    Null,
    /// A body with its raw bytes and declared content type
    Present(Vec<u8>, ContentType),
}

impl OptionalBody {
    /// Create a present body.
    #[must_use]
    pub fn present(bytes: impl Into<Vec<u8>>, content_type: ContentType) -> Self {
        Self::Present(bytes.into(), content_type)
    }

    /// Create a JSON body from a value.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        Self::Present(value.to_string().into_bytes(), ContentType::json())
    }

    /// Create a text body, detecting its content type.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        let bytes = text.into().into_bytes();
        let content_type = detect_content_type(&bytes);
        Self::Present(bytes, content_type)
    }

    /// Create an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self::Present(Vec::new(), ContentType::unknown())
    }

    /// Whether the body is missing.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Whether the body is explicitly null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the body is present with no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Present(bytes, _) if bytes.is_empty())
    }

    /// Whether the body is present with content.
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(bytes, _) if !bytes.is_empty())
    }

    /// Raw bytes of a present body.
    #[must_use]
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            Self::Present(bytes, _) => Some(bytes),
            _ => None,
        }
    }

    /// Declared content type of a present body.
    #[must_use]
    pub const fn content_type(&self) -> Option<&ContentType> {
        match self {
            Self::Present(_, ct) => Some(ct),
            _ => None,
        }
    }

    /// Replace the content type of a present body.
    #[must_use]
    pub fn with_content_type(self, content_type: ContentType) -> Self {
        match self {
            Self::Present(bytes, _) => Self::Present(bytes, content_type),
            other => other,
        }
    }

    /// The body as a string; empty for missing or null bodies.
    #[must_use]
    pub fn value_as_string(&self) -> String {
        self.value()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default()
    }

    /// The body encoded as base64; empty for missing or null bodies.
    #[must_use]
    pub fn value_as_base64(&self) -> String {
        self.value().map(|bytes| BASE64.encode(bytes)).unwrap_or_default()
    }

    /// Render the body for a pact document.
    ///
    /// `content_type` is the content type the owning part resolved, which may
    /// come from a header rather than the body itself. Returns `None` when the
    /// body key should be omitted.
    #[must_use]
    pub fn to_json(&self, content_type: &ContentType, version: PactSpecVersion) -> Option<Value> {
        match self {
            Self::Missing => None,
            Self::Null => Some(Value::Null),
            Self::Present(bytes, _) if bytes.is_empty() => Some(Value::String(String::new())),
            Self::Present(bytes, declared) => {
                let (content, encoded) = if content_type.is_json() {
                    match serde_json::from_slice::<Value>(bytes) {
                        Ok(Value::String(_)) | Err(_) => (Value::String(self.value_as_string()), false),
                        Ok(value) => (value, false),
                    }
                } else if content_type.is_binary() || content_type.is_multipart() {
                    (Value::String(BASE64.encode(bytes)), true)
                } else {
                    (Value::String(self.value_as_string()), false)
                };

                if version >= PactSpecVersion::V4 {
                    Some(json!({
                        "content": content,
                        "contentType": declared.to_string(),
                        "encoded": if encoded { json!("base64") } else { json!(false) },
                    }))
                } else {
                    Some(content)
                }
            }
        }
    }

    /// Extract the body from a pact document.
    ///
    /// `content_type` is the content type declared by the owning part
    /// (headers or metadata); when unknown it is detected from the content.
    #[must_use]
    pub fn from_pact_json(
        body: Option<&Value>,
        content_type: Option<ContentType>,
        version: PactSpecVersion,
    ) -> Self {
        match body {
            None => Self::Missing,
            Some(Value::Null) => Self::Null,
            Some(Value::Object(map)) if version >= PactSpecVersion::V4 && map.contains_key("content") => {
                let declared = map
                    .get("contentType")
                    .and_then(Value::as_str)
                    .map(ContentType::parse)
                    .or(content_type);
                let encoded = match map.get("encoded") {
                    Some(Value::Bool(flag)) => *flag,
                    Some(Value::String(enc)) => enc.eq_ignore_ascii_case("base64"),
                    _ => false,
                };
                match map.get("content") {
                    Some(Value::String(text)) if encoded => decode_base64(text, declared),
                    Some(Value::String(text)) => text_body(text, declared),
                    Some(other) => {
                        let ct = declared.unwrap_or_else(ContentType::json);
                        Self::Present(other.to_string().into_bytes(), ct)
                    }
                    None => Self::Missing,
                }
            }
            Some(Value::String(text)) => match content_type {
                Some(ct) if ct.is_binary() || ct.is_multipart() => decode_base64(text, Some(ct)),
                other => text_body(text, other),
            },
            Some(other) => {
                let ct = content_type
                    .filter(|ct| !ct.is_unknown())
                    .unwrap_or_else(ContentType::json);
                Self::Present(other.to_string().into_bytes(), ct)
            }
        }
    }
}

fn text_body(text: &str, content_type: Option<ContentType>) -> OptionalBody {
    if text.is_empty() {
        return OptionalBody::empty();
    }
    let ct = content_type
        .filter(|ct| !ct.is_unknown())
        .unwrap_or_else(|| detect_content_type(text.as_bytes()));
    OptionalBody::Present(text.as_bytes().to_vec(), ct)
}

fn decode_base64(text: &str, content_type: Option<ContentType>) -> OptionalBody {
    let ct = content_type.unwrap_or_else(ContentType::binary);
    match BASE64.decode(text) {
        Ok(bytes) => OptionalBody::Present(bytes, ct),
        Err(err) => {
            warn!(content_type = %ct, error = %err, "expected body to be base64 encoded, using it as text");
            OptionalBody::Present(text.as_bytes().to_vec(), ct)
        }
    }
}

impl PartialEq for OptionalBody {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Missing, Self::Missing) | (Self::Null, Self::Null) => true,
            (Self::Present(a, _), Self::Present(b, _)) => a == b,
            _ => false,
        }
    }
}

impl Eq for OptionalBody {}

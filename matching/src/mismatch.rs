//! Mismatches: the result of comparing an expected part against an actual one.
//!
//! Mismatches are plain data. An empty list means the actual value satisfied
//! every expectation.

use serde_json::{Value, json};
use std::fmt;

/// A single difference between an expected and an actual value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// Request methods differ
    MethodMismatch {
        /// Expected method
        expected: String,
        /// Actual method
        actual: String,
    },
    /// Request paths differ
    PathMismatch {
        /// Expected path
        expected: String,
        /// Actual path
        actual: String,
        /// Description of the mismatch
        mismatch: String,
    },
    /// Response statuses differ
    StatusMismatch {
        /// Expected status
        expected: u16,
        /// Actual status
        actual: u16,
        /// Description of the mismatch
        mismatch: String,
    },
    /// A query parameter is missing, unexpected or different
    QueryMismatch {
        /// Parameter name
        parameter: String,
        /// Expected value
        expected: String,
        /// Actual value
        actual: String,
        /// Description of the mismatch
        mismatch: String,
    },
    /// A header is missing or different
    HeaderMismatch {
        /// Header name
        key: String,
        /// Expected value
        expected: String,
        /// Actual value
        actual: String,
        /// Description of the mismatch
        mismatch: String,
    },
    /// Bodies have incompatible content types
    BodyTypeMismatch {
        /// Expected content type
        expected: String,
        /// Actual content type
        actual: String,
        /// Description of the mismatch
        mismatch: String,
    },
    /// A location inside the body differs
    BodyMismatch {
        /// Location of the mismatch
        path: String,
        /// Expected value, when there is one
        expected: Option<String>,
        /// Actual value, when there is one
        actual: Option<String>,
        /// Description of the mismatch
        mismatch: String,
    },
    /// A message metadata entry is missing or different
    MetadataMismatch {
        /// Metadata key
        key: String,
        /// Expected value
        expected: String,
        /// Actual value
        actual: String,
        /// Description of the mismatch
        mismatch: String,
    },
}

impl Mismatch {
    /// Create a body mismatch at a location.
    #[must_use]
    pub fn body(
        path: impl Into<String>,
        expected: Option<&Value>,
        actual: Option<&Value>,
        mismatch: impl Into<String>,
    ) -> Self {
        Self::BodyMismatch {
            path: path.into(),
            expected: expected.map(Value::to_string),
            actual: actual.map(Value::to_string),
            mismatch: mismatch.into(),
        }
    }

    /// Type tag of the mismatch.
    #[must_use]
    pub const fn mismatch_type(&self) -> &'static str {
        match self {
            Self::MethodMismatch { .. } => "MethodMismatch",
            Self::PathMismatch { .. } => "PathMismatch",
            Self::StatusMismatch { .. } => "StatusMismatch",
            Self::QueryMismatch { .. } => "QueryMismatch",
            Self::HeaderMismatch { .. } => "HeaderMismatch",
            Self::BodyTypeMismatch { .. } => "BodyTypeMismatch",
            Self::BodyMismatch { .. } => "BodyMismatch",
            Self::MetadataMismatch { .. } => "MetadataMismatch",
        }
    }

    /// Location of the mismatch: a body path, a header or parameter name,
    /// or the part of the interaction that differs.
    #[must_use]
    pub fn location(&self) -> String {
        match self {
            Self::MethodMismatch { .. } => "method".to_string(),
            Self::PathMismatch { .. } => "path".to_string(),
            Self::StatusMismatch { .. } => "status".to_string(),
            Self::QueryMismatch { parameter, .. } => parameter.clone(),
            Self::HeaderMismatch { key, .. } | Self::MetadataMismatch { key, .. } => key.clone(),
            Self::BodyTypeMismatch { .. } => "$".to_string(),
            Self::BodyMismatch { path, .. } => path.clone(),
        }
    }

    /// Human readable description.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::MethodMismatch { expected, actual } => {
                format!("Expected method {expected} but received {actual}")
            }
            Self::PathMismatch { mismatch, .. }
            | Self::StatusMismatch { mismatch, .. }
            | Self::QueryMismatch { mismatch, .. }
            | Self::HeaderMismatch { mismatch, .. }
            | Self::BodyTypeMismatch { mismatch, .. }
            | Self::BodyMismatch { mismatch, .. }
            | Self::MetadataMismatch { mismatch, .. } => mismatch.clone(),
        }
    }

    /// Render the mismatch for a verification report.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::MethodMismatch { expected, actual } => json!({
                "type": self.mismatch_type(),
                "expected": expected,
                "actual": actual,
                "mismatch": self.description(),
            }),
            Self::PathMismatch { expected, actual, mismatch } => json!({
                "type": self.mismatch_type(),
                "expected": expected,
                "actual": actual,
                "mismatch": mismatch,
            }),
            Self::StatusMismatch { expected, actual, mismatch } => json!({
                "type": self.mismatch_type(),
                "expected": expected,
                "actual": actual,
                "mismatch": mismatch,
            }),
            Self::QueryMismatch { parameter, expected, actual, mismatch } => json!({
                "type": self.mismatch_type(),
                "parameter": parameter,
                "expected": expected,
                "actual": actual,
                "mismatch": mismatch,
            }),
            Self::HeaderMismatch { key, expected, actual, mismatch }
            | Self::MetadataMismatch { key, expected, actual, mismatch } => json!({
                "type": self.mismatch_type(),
                "key": key,
                "expected": expected,
                "actual": actual,
                "mismatch": mismatch,
            }),
            Self::BodyTypeMismatch { expected, actual, mismatch } => json!({
                "type": self.mismatch_type(),
                "expected": expected,
                "actual": actual,
                "mismatch": mismatch,
            }),
            Self::BodyMismatch { path, expected, actual, mismatch } => json!({
                "type": self.mismatch_type(),
                "path": path,
                "expected": expected,
                "actual": actual,
                "mismatch": mismatch,
            }),
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.mismatch_type(), self.location(), self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_mismatch_json() {
        let mismatch = Mismatch::body("$.id", Some(&json!(1)), Some(&json!("1")), "Type mismatch");
        assert_eq!(
            mismatch.to_json(),
            json!({
                "type": "BodyMismatch",
                "path": "$.id",
                "expected": "1",
                "actual": "\"1\"",
                "mismatch": "Type mismatch"
            })
        );
        assert_eq!(mismatch.location(), "$.id");
    }

    #[test]
    fn test_display() {
        let mismatch = Mismatch::MethodMismatch {
            expected: "GET".to_string(),
            actual: "POST".to_string(),
        };
        assert_eq!(
            mismatch.to_string(),
            "MethodMismatch (method): Expected method GET but received POST"
        );
    }
}

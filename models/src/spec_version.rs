//! Pact specification versions.

use serde_json::Value;
use std::fmt;
use tracing::warn;

/// Version of the pact specification a document is written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PactSpecVersion {
    /// Version 1.0.0
    V1,
    /// Version 1.1.0
    V1_1,
    /// Version 2.0.0
    V2,
    /// Version 3.0.0
    #[default]
    V3,
    /// Version 4.0
    V4,
}

impl PactSpecVersion {
    /// Parse a version string such as `2.0.0`, `3.0.0` or `4.0`.
    #[must_use]
    pub fn parse(version: &str) -> Option<Self> {
        let mut parts = version.trim().trim_start_matches(['v', 'V']).split('.');
        let major = parts.next()?.parse::<u32>().ok()?;
        let minor = parts.next().map_or(Some(0), |m| m.parse::<u32>().ok())?;
        match (major, minor) {
            (1, 0) => Some(Self::V1),
            (1, _) => Some(Self::V1_1),
            (2, _) => Some(Self::V2),
            (3, _) => Some(Self::V3),
            (4, _) => Some(Self::V4),
            _ => None,
        }
    }

    /// Version string written into pact metadata.
    #[must_use]
    pub const fn version_str(self) -> &'static str {
        match self {
            Self::V1 => "1.0.0",
            Self::V1_1 => "1.1.0",
            Self::V2 => "2.0.0",
            Self::V3 => "3.0.0",
            Self::V4 => "4.0",
        }
    }

    /// Metadata key holding the specification version.
    ///
    /// V1/V2 documents use `pact-specification`, later ones `pactSpecification`.
    #[must_use]
    pub const fn metadata_key(self) -> &'static str {
        if matches!(self, Self::V1 | Self::V1_1 | Self::V2) {
            "pact-specification"
        } else {
            "pactSpecification"
        }
    }

    /// Determine the version a pact document was written with.
    ///
    /// Documents without version metadata are treated as V2.
    #[must_use]
    pub fn from_metadata(metadata: Option<&Value>) -> Self {
        let version = metadata.and_then(|m| {
            m.get("pactSpecification")
                .or_else(|| m.get("pact-specification"))
                .and_then(|spec| spec.get("version"))
                .or_else(|| m.get("pactSpecificationVersion"))
                .and_then(Value::as_str)
        });

        match version {
            Some(v) => Self::parse(v).unwrap_or_else(|| {
                warn!(version = v, "unrecognised pact specification version, assuming V3");
                Self::V3
            }),
            None => {
                warn!("pact document has no specification version, assuming V2");
                Self::V2
            }
        }
    }
}

impl fmt::Display for PactSpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "V1"),
            Self::V1_1 => write!(f, "V1.1"),
            Self::V2 => write!(f, "V2"),
            Self::V3 => write!(f, "V3"),
            Self::V4 => write!(f, "V4"),
        }
    }
}

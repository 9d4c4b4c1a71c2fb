//! Pact matching engine.
//!
//! Compares actual requests, responses and messages against the expectations
//! recorded in a pact:
//! - Rule resolution by path expression weight, with cascading to descendants
//! - Body matchers for JSON, XML, text, form and multipart content, selected
//!   by content type through an immutable registry with per-call overrides
//! - Header, query, path, status and metadata comparison
//! - Generator application for consumer tests and provider verification
//!
//! Matching is pure: every call owns its context, so comparisons can run on
//! any number of threads at once.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod body;
pub mod context;
pub mod form;
pub mod generate;
pub mod headers;
pub mod interaction;
pub mod json;
pub mod matchers;
pub mod metadata;
pub mod mismatch;
pub mod multipart;
pub mod query;
pub mod registry;
pub mod text;
pub mod xml;

pub use body::match_body;
pub use context::MatchingContext;
pub use generate::{generate_body, generate_message, generate_request, generate_response};
pub use headers::match_headers;
pub use interaction::{match_interaction, match_message, match_request, match_response};
pub use matchers::{RuleMatch, match_rules};
pub use metadata::match_metadata;
pub use mismatch::Mismatch;
pub use query::match_query;
pub use registry::{BodyMatcherKind, DiffConfig, MatchingConfig};

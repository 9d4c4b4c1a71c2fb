//! Shared library for cross-cutting concerns in the pact toolkit crates.
//!
//! This crate provides centralized implementations for:
//! - The error taxonomy shared by document loading, matching and verification
//! - Tracing subscriber initialisation for applications embedding the toolkit
//! - HTTP client configuration and building
//! - Retry policies with exponential backoff for fetching remote pacts

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod retry;
pub mod tracing_config;

pub use error::{PactError, PactResult};
pub use http::{HttpConfig, build_http_client};
pub use retry::{Backoff, RetryConfig, RetryPolicy};
pub use tracing_config::{TracingConfig, init_tracing};

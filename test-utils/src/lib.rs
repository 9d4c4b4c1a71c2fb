//! Shared test utilities for the pact toolkit crates.
//!
//! This crate provides:
//! - Proptest strategies for pact model types
//! - Sample pact documents for each specification version

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

pub use generators::*;

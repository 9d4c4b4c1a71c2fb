//! Provider verification.
//!
//! Loads pacts from files, URLs or a pact broker, replays each interaction
//! against the provider (or asks a message provider for the actual message),
//! and reports every mismatch per interaction:
//! - [`ContentFetcher`], [`ProviderClient`], [`BrokerClient`] and
//!   [`MessageProvider`] are the seams to the outside world
//! - [`PactLoader`] turns sources into parsed pacts
//! - [`ProviderVerifier`] drives the run and builds a [`VerificationReport`]

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod broker;
pub mod client;
pub mod config;
pub mod fetcher;
pub mod loader;
pub mod message;
pub mod report;
pub mod verifier;

pub use broker::{BrokerClient, BrokerPact, ConsumerVersionSelector, HttpBrokerClient, PactsForVerificationRequest};
pub use client::{HttpProviderClient, ProviderClient, StateChangeAction};
pub use config::VerifierConfig;
pub use fetcher::{ContentFetcher, DefaultContentFetcher};
pub use loader::{LoadFailure, LoadOutcome, LoadedPact, PactLoader};
pub use message::{MessageHandlers, MessageProvider};
pub use report::{InteractionOutcome, InteractionResult, PactVerification, ProviderVersion, VerificationReport};
pub use verifier::{InteractionFilter, ProviderVerifier};

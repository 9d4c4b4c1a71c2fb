//! Centralized error types for the pact toolkit crates.
//!
//! Structural problems (a malformed document, an unknown matcher, a provider
//! state value that cannot be resolved) are errors. Comparison outcomes are
//! never errors: matchers return mismatch lists as plain data.

use thiserror::Error;

/// Common error type for pact operations.
#[derive(Error, Debug)]
pub enum PactError {
    /// The pact document is malformed or incompatible with the requested version
    #[error("Invalid pact: {0}")]
    InvalidPact(String),

    /// A matcher, generator or body matcher identifier is not known
    #[error("Unsupported matcher '{name}'")]
    UnsupportedMatcher {
        /// The identifier that could not be resolved
        name: String,
    },

    /// No interactions could be resolved from the configured sources
    #[error("No pacts found for provider '{provider}': {reason}")]
    NoPactsFound {
        /// Provider the pacts were requested for
        provider: String,
        /// Description of the sources that were searched
        reason: String,
    },

    /// A provider state generator referenced a parameter that is not set
    #[error("Provider state parameter '{key}' was not found")]
    ProviderStateValueNotFound {
        /// The missing parameter name
        key: String,
    },

    /// A generator could not produce a value
    #[error("Generator error: {0}")]
    Generator(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading a local source failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A remote service is temporarily unavailable
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Timeout occurred
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Result type for pact operations.
pub type PactResult<T> = Result<T, PactError>;

impl PactError {
    /// Check if this error is retryable.
    ///
    /// Only transport failures are retried. Document and rule errors will
    /// fail the same way on every attempt.
    ///
    /// # Examples
    ///
    /// ```
    /// use pact_common::PactError;
    ///
    /// let err = PactError::unavailable("broker returned 503");
    /// assert!(err.is_retryable());
    ///
    /// let err = PactError::invalid_pact("missing consumer");
    /// assert!(!err.is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_) | Self::Http(_))
    }

    /// Check if this error aborts the verification of a single interaction.
    ///
    /// These errors are reported against the interaction and the run moves
    /// on to the next one.
    #[must_use]
    pub const fn is_fatal_for_interaction(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedMatcher { .. }
                | Self::ProviderStateValueNotFound { .. }
                | Self::Generator(_)
        )
    }

    /// Create an invalid pact error with the given message.
    #[must_use]
    pub fn invalid_pact(msg: impl Into<String>) -> Self {
        Self::InvalidPact(msg.into())
    }

    /// Create an unsupported matcher error for the given identifier.
    #[must_use]
    pub fn unsupported_matcher(name: impl Into<String>) -> Self {
        Self::UnsupportedMatcher { name: name.into() }
    }

    /// Create a no pacts found error.
    #[must_use]
    pub fn no_pacts_found(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NoPactsFound {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Create a generator error with the given message.
    #[must_use]
    pub fn generator(msg: impl Into<String>) -> Self {
        Self::Generator(msg.into())
    }

    /// Create a configuration error with the given message.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unavailable error with the given message.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(PactError::unavailable("test").is_retryable());
        assert!(PactError::Timeout("test".to_string()).is_retryable());
    }

    #[test]
    fn test_non_retryable_errors() {
        assert!(!PactError::invalid_pact("test").is_retryable());
        assert!(!PactError::unsupported_matcher("fuzzy").is_retryable());
        assert!(!PactError::no_pacts_found("provider", "no sources").is_retryable());
        assert!(
            !PactError::ProviderStateValueNotFound {
                key: "orderId".to_string()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_interaction_fatal_errors() {
        assert!(
            PactError::ProviderStateValueNotFound {
                key: "orderId".to_string()
            }
            .is_fatal_for_interaction()
        );
        assert!(PactError::unsupported_matcher("fuzzy").is_fatal_for_interaction());
        assert!(!PactError::invalid_pact("bad").is_fatal_for_interaction());
    }

    #[test]
    fn test_error_display() {
        let err = PactError::unsupported_matcher("fuzzy");
        assert_eq!(err.to_string(), "Unsupported matcher 'fuzzy'");

        let err = PactError::ProviderStateValueNotFound {
            key: "orderId".to_string(),
        };
        assert_eq!(err.to_string(), "Provider state parameter 'orderId' was not found");
    }
}

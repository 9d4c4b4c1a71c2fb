//! Verifier configuration.
//!
//! Loaded from the environment (and a `.env` file when present) with
//! validation, or assembled with the builder methods.

use crate::broker::{ConsumerVersionSelector, PactsForVerificationRequest};
use crate::report::ProviderVersion;
use pact_common::{PactError, PactResult, TracingConfig};
use std::env;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Provider verification settings.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Name of the provider under verification
    pub provider_name: String,
    /// Base URL the provider is listening on
    pub provider_base_url: Url,
    /// Endpoint receiving provider state change requests
    pub state_change_url: Option<Url>,
    /// Pact broker base URL
    pub broker_url: Option<Url>,
    /// Bearer token for the pact broker
    pub broker_token: Option<String>,
    /// Fail the load when no interactions were resolved
    pub fail_if_no_pacts_found: bool,
    /// Ask the broker for pending pacts
    pub enable_pending: bool,
    /// Tags of the provider version being verified
    pub provider_tags: Vec<String>,
    /// Branch of the provider version being verified
    pub provider_branch: Option<String>,
    /// Version of the provider being verified
    pub provider_version: Option<String>,
    /// Log level filter
    pub log_level: String,
    /// Emit JSON logs
    pub log_json: bool,
}

impl VerifierConfig {
    /// Configuration for a provider on the default base URL.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::Config`] when the provider name is empty.
    pub fn new(provider_name: impl Into<String>) -> PactResult<Self> {
        let config = Self {
            provider_name: provider_name.into(),
            provider_base_url: parse_url("PACT_PROVIDER_BASE_URL", DEFAULT_BASE_URL)?,
            state_change_url: None,
            broker_url: None,
            broker_token: None,
            fail_if_no_pacts_found: true,
            enable_pending: false,
            provider_tags: Vec::new(),
            provider_branch: None,
            provider_version: None,
            log_level: "info".to_string(),
            log_json: false,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::Config`] when a variable is missing or invalid.
    pub fn from_env() -> PactResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::Config`] when a variable is missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PactResult<Self> {
        let provider_name = lookup("PACT_PROVIDER_NAME")
            .ok_or_else(|| PactError::config("Missing required configuration: PACT_PROVIDER_NAME"))?;
        let optional_url = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .map(|value| parse_url(name, &value))
                .transpose()
        };

        let config = Self {
            provider_name,
            provider_base_url: parse_url(
                "PACT_PROVIDER_BASE_URL",
                &lookup("PACT_PROVIDER_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            )?,
            state_change_url: optional_url("PACT_PROVIDER_STATES_URL")?,
            broker_url: optional_url("PACT_BROKER_URL")?,
            broker_token: lookup("PACT_BROKER_TOKEN").filter(|token| !token.is_empty()),
            fail_if_no_pacts_found: parse_bool("PACT_FAIL_IF_NO_PACTS_FOUND", lookup("PACT_FAIL_IF_NO_PACTS_FOUND"), true)?,
            enable_pending: parse_bool("PACT_ENABLE_PENDING", lookup("PACT_ENABLE_PENDING"), false)?,
            provider_tags: parse_list(lookup("PACT_PROVIDER_TAGS")),
            provider_branch: lookup("PACT_PROVIDER_BRANCH").filter(|branch| !branch.is_empty()),
            provider_version: lookup("PACT_PROVIDER_VERSION").filter(|version| !version.is_empty()),
            log_level: lookup("PACT_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: parse_bool("PACT_LOG_JSON", lookup("PACT_LOG_JSON"), false)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> PactResult<()> {
        if self.provider_name.trim().is_empty() {
            return Err(PactError::config("Provider name must not be empty"));
        }
        if self.enable_pending && self.provider_tags.is_empty() && self.provider_branch.is_none() {
            return Err(PactError::config(
                "Pending pacts are enabled, but no provider tags or branch have been specified",
            ));
        }
        Ok(())
    }

    /// Set the provider base URL.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::Config`] for an invalid URL.
    pub fn with_base_url(mut self, url: &str) -> PactResult<Self> {
        self.provider_base_url = parse_url("PACT_PROVIDER_BASE_URL", url)?;
        Ok(self)
    }

    /// Set the provider state change endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::Config`] for an invalid URL.
    pub fn with_state_change_url(mut self, url: &str) -> PactResult<Self> {
        self.state_change_url = Some(parse_url("PACT_PROVIDER_STATES_URL", url)?);
        Ok(self)
    }

    /// Set the pact broker URL.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::Config`] for an invalid URL.
    pub fn with_broker_url(mut self, url: &str) -> PactResult<Self> {
        self.broker_url = Some(parse_url("PACT_BROKER_URL", url)?);
        Ok(self)
    }

    /// Set whether an empty load is an error.
    #[must_use]
    pub const fn with_fail_if_no_pacts_found(mut self, fail: bool) -> Self {
        self.fail_if_no_pacts_found = fail;
        self
    }

    /// Enable pending pacts for the given provider tags.
    #[must_use]
    pub fn with_pending(mut self, provider_tags: Vec<String>) -> Self {
        self.enable_pending = true;
        self.provider_tags = provider_tags;
        self
    }

    /// Set the provider branch.
    #[must_use]
    pub fn with_provider_branch(mut self, branch: impl Into<String>) -> Self {
        self.provider_branch = Some(branch.into());
        self
    }

    /// Set the provider version.
    #[must_use]
    pub fn with_provider_version(mut self, version: impl Into<String>) -> Self {
        self.provider_version = Some(version.into());
        self
    }

    /// Broker request for the configured provider version.
    #[must_use]
    pub fn broker_request(&self, selectors: Vec<ConsumerVersionSelector>) -> PactsForVerificationRequest {
        PactsForVerificationRequest {
            selectors,
            provider_tags: self.provider_tags.clone(),
            provider_branch: self.provider_branch.clone(),
            include_pending: self.enable_pending,
            include_wip_since: None,
        }
    }

    /// The provider version recorded in reports.
    #[must_use]
    pub fn reported_version(&self) -> Option<ProviderVersion> {
        self.provider_version.as_ref().map(|version| ProviderVersion {
            version: version.clone(),
            branch: self.provider_branch.clone(),
            tags: self.provider_tags.clone(),
        })
    }

    /// Tracing setup matching the configured log options.
    #[must_use]
    pub fn tracing_config(&self) -> TracingConfig {
        let config = TracingConfig::default().with_log_level(&self.log_level);
        if self.log_json { config.with_json_output() } else { config }
    }
}

fn parse_url(name: &str, value: &str) -> PactResult<Url> {
    Url::parse(value).map_err(|e| PactError::config(format!("Invalid URL for {name}: {e}")))
}

fn parse_bool(name: &str, value: Option<String>, default: bool) -> PactResult<bool> {
    match value {
        Some(value) => value
            .trim()
            .to_ascii_lowercase()
            .parse()
            .map_err(|e| PactError::config(format!("Failed to parse environment variable {name}: {e}"))),
        None => Ok(default),
    }
}

fn parse_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = VerifierConfig::from_lookup(lookup(&[("PACT_PROVIDER_NAME", "order-service")])).unwrap();
        assert_eq!(config.provider_name, "order-service");
        assert_eq!(config.provider_base_url.as_str(), "http://localhost:8080/");
        assert!(config.fail_if_no_pacts_found);
        assert!(!config.enable_pending);
        assert!(config.broker_url.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_all_variables() {
        let config = VerifierConfig::from_lookup(lookup(&[
            ("PACT_PROVIDER_NAME", "order-service"),
            ("PACT_PROVIDER_BASE_URL", "http://localhost:9000/api"),
            ("PACT_BROKER_URL", "https://broker.example.com"),
            ("PACT_FAIL_IF_NO_PACTS_FOUND", "FALSE"),
            ("PACT_ENABLE_PENDING", "true"),
            ("PACT_PROVIDER_TAGS", "main, prod,"),
            ("PACT_LOG_JSON", "true"),
        ]))
        .unwrap();
        assert_eq!(config.provider_base_url.path(), "/api");
        assert!(!config.fail_if_no_pacts_found);
        assert_eq!(config.provider_tags, vec!["main", "prod"]);
        assert!(config.tracing_config().json_output);

        let request = config.broker_request(vec![ConsumerVersionSelector::main_branch()]);
        assert!(request.include_pending);
        assert!(request.validate().is_ok());
        assert!(config.reported_version().is_none());
    }

    #[test]
    fn test_missing_provider_name() {
        let err = VerifierConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, PactError::Config(msg) if msg.contains("PACT_PROVIDER_NAME")));
    }

    #[test]
    fn test_invalid_values() {
        assert!(VerifierConfig::from_lookup(lookup(&[
            ("PACT_PROVIDER_NAME", "order-service"),
            ("PACT_BROKER_URL", "not a url"),
        ]))
        .is_err());
        assert!(VerifierConfig::from_lookup(lookup(&[
            ("PACT_PROVIDER_NAME", "order-service"),
            ("PACT_LOG_JSON", "sometimes"),
        ]))
        .is_err());
    }

    #[test]
    fn test_pending_requires_provider_tags_or_branch() {
        let err = VerifierConfig::from_lookup(lookup(&[
            ("PACT_PROVIDER_NAME", "order-service"),
            ("PACT_ENABLE_PENDING", "true"),
        ]))
        .unwrap_err();
        assert!(matches!(err, PactError::Config(_)));

        let config = VerifierConfig::from_lookup(lookup(&[
            ("PACT_PROVIDER_NAME", "order-service"),
            ("PACT_ENABLE_PENDING", "true"),
            ("PACT_PROVIDER_BRANCH", "main"),
        ]))
        .unwrap();
        assert!(config.enable_pending);
    }

    #[test]
    fn test_builder() {
        let config = VerifierConfig::new("order-service")
            .unwrap()
            .with_base_url("http://127.0.0.1:3000")
            .unwrap()
            .with_fail_if_no_pacts_found(false)
            .with_provider_branch("main")
            .with_provider_version("1.4.0");
        assert_eq!(config.provider_base_url.port(), Some(3000));
        let version = config.reported_version().unwrap();
        assert_eq!(version.branch.as_deref(), Some("main"));
        assert!(!config.fail_if_no_pacts_found);
        assert!(VerifierConfig::new("  ").is_err());
    }
}

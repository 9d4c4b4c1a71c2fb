//! HTTP client building for pact transports.
//!
//! Pact documents, broker resources and provider replays all go through
//! `reqwest`. The replay client must see redirects as the provider sent them,
//! since a pact may expect a 3xx status, so redirect handling is part of the
//! configuration rather than fixed.

use crate::error::{PactError, PactResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, redirect};
use std::time::Duration;

const MAX_REDIRECTS: usize = 10;

/// Transport settings shared by the fetcher, broker and replay clients.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whole-request timeout (default: 30s)
    pub timeout: Duration,
    /// TCP connect timeout (default: 10s)
    pub connect_timeout: Duration,
    /// Sent as `User-Agent`
    pub user_agent: String,
    /// Follow 3xx responses (default: true)
    pub follow_redirects: bool,
    /// Skip TLS certificate verification, for providers on self-signed certificates
    pub insecure_tls: bool,
    /// Headers added to every request, in order
    pub default_headers: Vec<(String, String)>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("pact-toolkit/", env!("CARGO_PKG_VERSION")).to_string(),
            follow_redirects: true,
            insecure_tls: false,
            default_headers: Vec::new(),
        }
    }
}

impl HttpConfig {
    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Return 3xx responses instead of following them.
    #[must_use]
    pub const fn without_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }

    /// Accept any TLS certificate.
    #[must_use]
    pub const fn with_insecure_tls(mut self) -> Self {
        self.insecure_tls = true;
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    fn header_map(&self) -> PactResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| PactError::config(format!("Invalid header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| PactError::config(format!("Invalid value for header '{name}': {e}")))?;
            headers.append(name, value);
        }
        Ok(headers)
    }
}

/// Build a `reqwest` client with rustls from the configuration.
///
/// # Errors
///
/// Returns [`PactError::Config`] for an invalid default header and
/// [`PactError::Http`] when the client cannot be built.
///
/// # Examples
///
/// ```
/// use pact_common::{HttpConfig, build_http_client};
/// use std::time::Duration;
///
/// let config = HttpConfig::default()
///     .with_timeout(Duration::from_secs(5))
///     .without_redirects();
/// assert!(build_http_client(&config).is_ok());
/// ```
pub fn build_http_client(config: &HttpConfig) -> PactResult<Client> {
    let policy = if config.follow_redirects {
        redirect::Policy::limited(MAX_REDIRECTS)
    } else {
        redirect::Policy::none()
    };
    let client = Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(&config.user_agent)
        .default_headers(config.header_map()?)
        .redirect(policy)
        .danger_accept_invalid_certs(config.insecure_tls)
        .use_rustls_tls()
        .build()?;
    Ok(client)
}

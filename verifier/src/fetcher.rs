//! Fetching raw pact documents from files and URLs.

use async_trait::async_trait;
use pact_common::{HttpConfig, PactError, PactResult, RetryConfig, RetryPolicy, build_http_client};
use pact_models::PactSource;
use reqwest::{Client, StatusCode};
use tracing::{debug, instrument};

/// Resolves a pact source to the bytes of the document.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the raw document behind a source.
    async fn fetch(&self, source: &PactSource) -> PactResult<Vec<u8>>;
}

/// Reads files with `tokio::fs` and URLs with `reqwest`, retrying
/// transient failures.
#[derive(Debug, Clone)]
pub struct DefaultContentFetcher {
    http: Client,
    retry: RetryPolicy,
}

impl DefaultContentFetcher {
    /// Create a fetcher with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::Http`] when the client cannot be built.
    pub fn new(http_config: &HttpConfig, retry_config: RetryConfig) -> PactResult<Self> {
        Ok(Self::with_client(build_http_client(http_config)?, retry_config))
    }

    /// Create a fetcher sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(http: Client, retry_config: RetryConfig) -> Self {
        Self {
            http,
            retry: RetryPolicy::new(retry_config),
        }
    }

    async fn fetch_url(&self, url: &str) -> PactResult<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .header("Accept", "application/hal+json, application/json")
            .send()
            .await
            .map_err(|e| PactError::unavailable(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(PactError::unavailable(format!("{url} returned {status}")));
        }
        if !status.is_success() {
            return Err(PactError::invalid_pact(format!("Could not fetch pact from {url}: {status}")));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ContentFetcher for DefaultContentFetcher {
    #[instrument(skip_all, fields(source = %source))]
    async fn fetch(&self, source: &PactSource) -> PactResult<Vec<u8>> {
        match source {
            PactSource::File(path) => {
                debug!(path = %path.display(), "reading pact file");
                Ok(tokio::fs::read(path).await?)
            }
            PactSource::Url(url) => self.retry.execute(|| self.fetch_url(url)).await,
            PactSource::Broker { .. } => Err(PactError::config(
                "Broker sources are resolved through a broker client",
            )),
            PactSource::Unknown => Err(PactError::config("Cannot fetch a pact without a source")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> DefaultContentFetcher {
        DefaultContentFetcher::with_client(
            Client::new(),
            RetryConfig::default()
                .with_max_retries(2)
                .with_initial_delay(Duration::from_millis(1))
                .without_jitter(),
        )
    }

    #[tokio::test]
    async fn test_fetch_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{\"consumer\":{}}").unwrap();
        let bytes = fetcher()
            .fetch(&PactSource::File(file.path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(bytes, b"{\"consumer\":{}}");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let err = fetcher()
            .fetch(&PactSource::File("/definitely/not/here.json".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, PactError::Io(_)));
    }

    #[tokio::test]
    async fn test_fetch_url_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pact.json"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/pact.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let bytes = fetcher()
            .fetch(&PactSource::Url(format!("{}/pact.json", server.uri())))
            .await
            .unwrap();
        assert_eq!(bytes, b"{}");
    }

    #[tokio::test]
    async fn test_fetch_url_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = fetcher()
            .fetch(&PactSource::Url(format!("{}/missing.json", server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(err, PactError::InvalidPact(_)));
    }

    #[tokio::test]
    async fn test_unknown_source() {
        assert!(fetcher().fetch(&PactSource::Unknown).await.is_err());
    }
}

//! Replaying expected requests against a running provider.

use async_trait::async_trait;
use pact_common::{HttpConfig, PactError, PactResult, build_http_client};
use pact_models::{
    ContentType, Headers, HttpPart, OptionalBody, ProviderState, Request, Response, detect_content_type,
};
use reqwest::{Client, Method};
use serde_json::{Value, json};
use tracing::{debug, instrument};
use url::Url;

/// Whether a provider state is being set up or torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChangeAction {
    /// Before the interaction is replayed
    Setup,
    /// After the interaction was verified
    Teardown,
}

impl StateChangeAction {
    /// Wire name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Teardown => "teardown",
        }
    }
}

/// Performs requests against the provider under verification.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Send a request and return what the provider answered.
    async fn make_request(&self, request: &Request) -> PactResult<Response>;

    /// Establish or remove a provider state. The default does nothing.
    async fn change_state(&self, _state: &ProviderState, _action: StateChangeAction) -> PactResult<()> {
        Ok(())
    }
}

/// [`ProviderClient`] talking HTTP to a provider base URL.
#[derive(Debug, Clone)]
pub struct HttpProviderClient {
    base_url: String,
    state_change_url: Option<Url>,
    http: Client,
}

fn strip_trailing_slash(base: &str) -> &str {
    base.strip_suffix('/').unwrap_or(base)
}

impl HttpProviderClient {
    /// Create a client for a provider base URL. Redirects are never
    /// followed, so the provider's own 3xx status reaches the matcher.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(base_url: &Url, http_config: &HttpConfig) -> PactResult<Self> {
        let http = build_http_client(&http_config.clone().without_redirects())?;
        Ok(Self::with_client(base_url, http))
    }

    /// Create a client sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(base_url: &Url, http: Client) -> Self {
        Self {
            base_url: strip_trailing_slash(base_url.as_str()).to_string(),
            state_change_url: None,
            http,
        }
    }

    /// Post provider state changes to this endpoint.
    #[must_use]
    pub fn with_state_change_url(mut self, url: Url) -> Self {
        self.state_change_url = Some(url);
        self
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    async fn to_response(response: reqwest::Response) -> PactResult<Response> {
        let status = response.status().as_u16();
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }
        let bytes = response.bytes().await?.to_vec();

        let mut actual = Response::new(status);
        actual.headers = headers;
        actual.body = if bytes.is_empty() {
            OptionalBody::Missing
        } else {
            let content_type = actual.content_type_header().unwrap_or_else(|| detect_content_type(&bytes));
            OptionalBody::present(bytes, content_type)
        };
        Ok(actual)
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    #[instrument(skip_all, fields(method = %request.method, path = %request.path))]
    async fn make_request(&self, request: &Request) -> PactResult<Response> {
        let method = Method::from_bytes(request.method.to_uppercase().as_bytes())
            .map_err(|e| PactError::invalid_pact(format!("Invalid request method '{}': {e}", request.method)))?;

        let query: Vec<(&str, &str)> = request
            .query
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |value| (name.as_str(), value.as_str())))
            .collect();

        let mut builder = self.http.request(method, self.url_for(&request.path));
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        for (name, values) in &request.headers {
            builder = builder.header(name.as_str(), values.join(", "));
        }
        if let OptionalBody::Present(bytes, content_type) = &request.body {
            if !request.has_header("content-type") && !content_type.is_unknown() {
                builder = builder.header("Content-Type", content_type.to_string());
            }
            builder = builder.body(bytes.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PactError::unavailable(format!("Request to provider failed: {e}")))?;
        let actual = Self::to_response(response).await?;
        debug!(status = actual.status, "provider responded");
        Ok(actual)
    }

    #[instrument(skip_all, fields(state = %state.name, action = action.as_str()))]
    async fn change_state(&self, state: &ProviderState, action: StateChangeAction) -> PactResult<()> {
        let Some(url) = &self.state_change_url else {
            debug!("no state change URL configured");
            return Ok(());
        };
        let params: serde_json::Map<String, Value> =
            state.params.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let body = json!({
            "state": state.name,
            "params": params,
            "action": action.as_str(),
        });

        let response = self
            .http
            .post(url.clone())
            .header("Content-Type", ContentType::json().to_string())
            .json(&body)
            .send()
            .await
            .map_err(|e| PactError::unavailable(format!("State change request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PactError::unavailable(format!(
                "State change request for '{}' returned {status}: {text}",
                state.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> HttpProviderClient {
        let base = Url::parse(&format!("{}/", server.uri())).unwrap();
        HttpProviderClient::with_client(&base, Client::new())
    }

    #[test]
    fn test_trailing_slash_is_stripped() {
        assert_eq!(strip_trailing_slash("http://localhost:8080/"), "http://localhost:8080");
        assert_eq!(strip_trailing_slash("http://localhost:8080/api"), "http://localhost:8080/api");
    }

    #[tokio::test]
    async fn test_make_request_maps_every_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/orders"))
            .and(query_param("dryRun", "true"))
            .and(header("X-Request-Id", "abc"))
            .and(body_json(json!({"sku": "A-1"})))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Content-Type", "application/json")
                    .set_body_json(json!({"id": 7})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = Request::new("post", "/orders")
            .with_query_param("dryRun", "true")
            .with_header("X-Request-Id", "abc")
            .with_body(OptionalBody::from_json(&json!({"sku": "A-1"})));
        let response = client_for(&server).await.make_request(&request).await.unwrap();

        assert_eq!(response.status, 201);
        assert!(response.determine_content_type().is_json());
        let body: Value = serde_json::from_slice(response.body.value().unwrap()).unwrap();
        assert_eq!(body, json!({"id": 7}));
    }

    #[tokio::test]
    async fn test_empty_response_body_is_missing() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        let response = client_for(&server)
            .await
            .make_request(&Request::new("DELETE", "/orders/1"))
            .await
            .unwrap();
        assert_eq!(response.status, 204);
        assert!(response.body.is_missing());
    }

    #[tokio::test]
    async fn test_redirects_reach_the_matcher() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/legacy/orders"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/orders"))
            .mount(&server)
            .await;
        let base = Url::parse(&server.uri()).unwrap();
        let client = HttpProviderClient::new(&base, &HttpConfig::default()).unwrap();
        let response = client.make_request(&Request::new("GET", "/legacy/orders")).await.unwrap();
        assert_eq!(response.status, 302);
    }

    #[tokio::test]
    async fn test_state_change_posts_state_and_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/_pact/state"))
            .and(body_json(json!({"state": "an order exists", "params": {"orderId": 10}, "action": "setup"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let state_url = Url::parse(&format!("{}/_pact/state", server.uri())).unwrap();
        let client = client_for(&server).await.with_state_change_url(state_url);
        let mut params = std::collections::BTreeMap::new();
        params.insert("orderId".to_string(), json!(10));
        client
            .change_state(&ProviderState::with_params("an order exists", params), StateChangeAction::Setup)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_state_change_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let state_url = Url::parse(&format!("{}/state", server.uri())).unwrap();
        let client = client_for(&server).await.with_state_change_url(state_url);
        let result = client
            .change_state(&ProviderState::new("broken"), StateChangeAction::Setup)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_state_change_without_url_is_a_no_op() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;
        assert!(client
            .change_state(&ProviderState::new("anything"), StateChangeAction::Teardown)
            .await
            .is_ok());
    }
}

//! Pact broker access: selecting and downloading the pacts to verify.

use async_trait::async_trait;
use pact_common::{PactError, PactResult, RetryConfig, RetryPolicy};
use pact_models::PactSource;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument};
use url::Url;

/// Criteria the broker uses to choose consumer versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerVersionSelector {
    /// Consumer version tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Consumer version branch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Restrict to one consumer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<String>,
    /// Only the latest version for the tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest: Option<bool>,
    /// Versions currently deployed or released
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deployed_or_released: bool,
    /// Versions from the consumer's main branch
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub main_branch: bool,
    /// Tag to use when no version has the requested tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_tag: Option<String>,
}

impl ConsumerVersionSelector {
    /// Latest version with a tag.
    #[must_use]
    pub fn latest_tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            latest: Some(true),
            ..Self::default()
        }
    }

    /// Latest version on a branch.
    #[must_use]
    pub fn branch(branch: impl Into<String>) -> Self {
        Self {
            branch: Some(branch.into()),
            ..Self::default()
        }
    }

    /// Versions on each consumer's main branch.
    #[must_use]
    pub fn main_branch() -> Self {
        Self {
            main_branch: true,
            ..Self::default()
        }
    }

    /// Versions deployed or released to any environment.
    #[must_use]
    pub fn deployed_or_released() -> Self {
        Self {
            deployed_or_released: true,
            ..Self::default()
        }
    }

    /// Restrict the selector to one consumer.
    #[must_use]
    pub fn for_consumer(mut self, consumer: impl Into<String>) -> Self {
        self.consumer = Some(consumer.into());
        self
    }

    /// Fall back to another tag when no version has the requested one.
    #[must_use]
    pub fn with_fallback_tag(mut self, tag: impl Into<String>) -> Self {
        self.fallback_tag = Some(tag.into());
        self
    }

    /// Check the selector can be sent to a broker.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::Config`] for a selector without criteria or a
    /// fallback tag without a tag.
    pub fn validate(&self) -> PactResult<()> {
        let has_criteria = self.tag.is_some()
            || self.branch.is_some()
            || self.consumer.is_some()
            || self.main_branch
            || self.deployed_or_released;
        if !has_criteria {
            return Err(PactError::config(
                "A consumer version selector needs a tag, branch, consumer, mainBranch or deployedOrReleased",
            ));
        }
        if self.fallback_tag.is_some() && self.tag.is_none() {
            return Err(PactError::config("A fallback tag can only be used together with a tag"));
        }
        Ok(())
    }
}

/// What to ask the broker for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PactsForVerificationRequest {
    /// Consumer version selectors; empty means the broker default
    pub selectors: Vec<ConsumerVersionSelector>,
    /// Tags of the provider version being verified
    pub provider_tags: Vec<String>,
    /// Branch of the provider version being verified
    pub provider_branch: Option<String>,
    /// Include pending pacts
    pub include_pending: bool,
    /// Include work-in-progress pacts created since this date
    pub include_wip_since: Option<String>,
}

impl PactsForVerificationRequest {
    /// Check the request can be sent to a broker.
    ///
    /// # Errors
    ///
    /// Returns [`PactError::Config`] for invalid selectors, or when pending
    /// or WIP pacts are requested without provider tags or a branch.
    pub fn validate(&self) -> PactResult<()> {
        for selector in &self.selectors {
            selector.validate()?;
        }
        let needs_provider_version = self.include_pending || self.include_wip_since.is_some();
        if needs_provider_version && self.provider_tags.is_empty() && self.provider_branch.is_none() {
            return Err(PactError::config(
                "Pending pacts have been enabled, but no provider tags or branch have been specified. \
                 The broker needs them to decide which pacts are pending for this provider version",
            ));
        }
        Ok(())
    }

    /// Render the request body for the broker.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "consumerVersionSelectors": self.selectors,
            "includePendingStatus": self.include_pending,
        });
        if !self.provider_tags.is_empty() {
            body["providerVersionTags"] = json!(self.provider_tags);
        }
        if let Some(branch) = &self.provider_branch {
            body["providerVersionBranch"] = json!(branch);
        }
        if let Some(since) = &self.include_wip_since {
            body["includeWipPactsSince"] = json!(since);
        }
        body
    }
}

/// A pact document returned by the broker, with its verification context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerPact {
    /// Raw pact document
    pub document: Vec<u8>,
    /// Where the pact came from
    pub source: PactSource,
    /// Failures of pending pacts do not fail the build
    pub pending: bool,
    /// Work-in-progress pact
    pub wip: bool,
    /// Messages from the broker explaining why the pact was selected
    pub notices: Vec<String>,
}

/// Finds the pacts a provider has to verify.
#[async_trait]
pub trait BrokerClient: Send + Sync {
    /// Fetch every pact matching the request for a provider.
    async fn fetch_pacts(&self, provider: &str, request: &PactsForVerificationRequest) -> PactResult<Vec<BrokerPact>>;
}

/// [`BrokerClient`] for the pact broker HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBrokerClient {
    base_url: Url,
    token: Option<String>,
    http: Client,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct PactsForVerification {
    #[serde(rename = "_embedded", default)]
    embedded: EmbeddedPacts,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddedPacts {
    #[serde(default)]
    pacts: Vec<PactForVerification>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PactForVerification {
    #[serde(default)]
    verification_properties: VerificationProperties,
    #[serde(rename = "_links")]
    links: PactLinks,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerificationProperties {
    #[serde(default)]
    pending: bool,
    #[serde(default)]
    wip: bool,
    #[serde(default)]
    notices: Vec<Notice>,
}

#[derive(Debug, Deserialize)]
struct Notice {
    text: String,
}

#[derive(Debug, Deserialize)]
struct PactLinks {
    #[serde(rename = "self")]
    self_link: Link,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

fn check_status(status: StatusCode, url: &str) -> PactResult<()> {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return Err(PactError::unavailable(format!("Pact broker returned {status} for {url}")));
    }
    if !status.is_success() {
        return Err(PactError::config(format!("Pact broker returned {status} for {url}")));
    }
    Ok(())
}

impl HttpBrokerClient {
    /// Create a client for a broker.
    #[must_use]
    pub fn new(base_url: Url, http: Client, retry_config: RetryConfig) -> Self {
        Self {
            base_url,
            token: None,
            http,
            retry: RetryPolicy::new(retry_config),
        }
    }

    /// Authenticate with a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn for_verification_url(&self, provider: &str) -> PactResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| PactError::config(format!("Broker URL {} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(["pacts", "provider", provider, "for-verification"]);
        Ok(url)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn post_for_verification(&self, url: &Url, body: &Value) -> PactResult<Option<PactsForVerification>> {
        let response = self
            .authorized(self.http.post(url.clone()))
            .header("Accept", "application/hal+json")
            .json(body)
            .send()
            .await
            .map_err(|e| PactError::unavailable(format!("Pact broker request failed: {e}")))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check_status(response.status(), url.as_str())?;
        Ok(Some(response.json().await?))
    }

    async fn get_document(&self, href: &str) -> PactResult<Vec<u8>> {
        let response = self
            .authorized(self.http.get(href))
            .header("Accept", "application/hal+json, application/json")
            .send()
            .await
            .map_err(|e| PactError::unavailable(format!("Pact broker request failed: {e}")))?;
        check_status(response.status(), href)?;
        Ok(response.bytes().await?.to_vec())
    }
}

fn consumer_name(document: &[u8]) -> String {
    serde_json::from_slice::<Value>(document)
        .ok()
        .and_then(|json| json.pointer("/consumer/name").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

#[async_trait]
impl BrokerClient for HttpBrokerClient {
    #[instrument(skip_all, fields(provider = %provider, broker = %self.base_url))]
    async fn fetch_pacts(&self, provider: &str, request: &PactsForVerificationRequest) -> PactResult<Vec<BrokerPact>> {
        request.validate()?;
        let url = self.for_verification_url(provider)?;
        let body = request.to_json();
        debug!(%url, "requesting pacts for verification");

        let Some(found) = self
            .retry
            .execute(|| self.post_for_verification(&url, &body))
            .await?
        else {
            info!("broker knows no pacts for this provider");
            return Ok(Vec::new());
        };

        let mut pacts = Vec::with_capacity(found.embedded.pacts.len());
        for pact in found.embedded.pacts {
            let href = pact.links.self_link.href;
            let document = self.retry.execute(|| self.get_document(&href)).await?;
            let properties = pact.verification_properties;
            let tags = request
                .selectors
                .iter()
                .filter_map(|selector| selector.tag.clone())
                .collect();
            pacts.push(BrokerPact {
                source: PactSource::Broker {
                    url: self.base_url.to_string(),
                    consumer: consumer_name(&document),
                    provider: provider.to_string(),
                    tags,
                    pending: properties.pending,
                    wip: properties.wip,
                },
                document,
                pending: properties.pending,
                wip: properties.wip,
                notices: properties.notices.into_iter().map(|notice| notice.text).collect(),
            });
        }
        info!(count = pacts.len(), "fetched pacts from broker");
        Ok(pacts)
    }
}

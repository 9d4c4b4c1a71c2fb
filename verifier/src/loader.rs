//! Resolving pact sources into parsed pacts for a provider.
//!
//! A source that cannot be fetched or parsed is recorded as a failure and
//! loading carries on with the remaining sources.

use crate::broker::{BrokerClient, PactsForVerificationRequest};
use crate::fetcher::ContentFetcher;
use pact_common::{PactError, PactResult};
use pact_models::{Pact, PactSource};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A parsed pact ready for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPact {
    /// The pact
    pub pact: Pact,
    /// Failures of pending pacts do not fail the run
    pub pending: bool,
    /// Broker notices explaining the selection
    pub notices: Vec<String>,
}

impl LoadedPact {
    /// Wrap a pact that is not pending.
    #[must_use]
    pub fn new(pact: Pact) -> Self {
        Self {
            pact,
            pending: false,
            notices: Vec::new(),
        }
    }
}

/// A source that could not be loaded.
#[derive(Debug)]
pub struct LoadFailure {
    /// Description of the source
    pub source: String,
    /// Why loading failed
    pub error: PactError,
}

/// Everything a load produced.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Pacts in source order
    pub pacts: Vec<LoadedPact>,
    /// Sources that failed
    pub failures: Vec<LoadFailure>,
}

impl LoadOutcome {
    /// Total number of interactions across the loaded pacts.
    #[must_use]
    pub fn interaction_count(&self) -> usize {
        self.pacts.iter().map(|loaded| loaded.pact.interaction_count()).sum()
    }
}

/// Loads pacts from files, URLs and a broker.
pub struct PactLoader {
    fetcher: Arc<dyn ContentFetcher>,
    broker: Option<(Arc<dyn BrokerClient>, PactsForVerificationRequest)>,
    fail_if_no_pacts_found: bool,
}

impl PactLoader {
    /// Create a loader that fails when nothing was found.
    #[must_use]
    pub fn new(fetcher: Arc<dyn ContentFetcher>) -> Self {
        Self {
            fetcher,
            broker: None,
            fail_if_no_pacts_found: true,
        }
    }

    /// Also load the pacts a broker selects.
    #[must_use]
    pub fn with_broker(mut self, broker: Arc<dyn BrokerClient>, request: PactsForVerificationRequest) -> Self {
        self.broker = Some((broker, request));
        self
    }

    /// Set whether an empty load is an error.
    #[must_use]
    pub const fn with_fail_if_no_pacts_found(mut self, fail: bool) -> Self {
        self.fail_if_no_pacts_found = fail;
        self
    }

    fn parse(document: &[u8], source: PactSource, provider: &str) -> PactResult<Option<Pact>> {
        let pact = Pact::from_slice(document)?.with_source(source);
        if pact.provider().name == provider {
            Ok(Some(pact))
        } else {
            warn!(
                source = %pact.source(),
                found = %pact.provider().name,
                "skipping pact for a different provider"
            );
            Ok(None)
        }
    }

    /// Load every source, then the broker's selection.
    ///
    /// # Errors
    ///
    /// Broker errors are returned as-is. Returns [`PactError::NoPactsFound`]
    /// when no interaction was resolved and the loader is configured to
    /// fail in that case.
    #[instrument(skip_all, fields(provider = %provider, sources = sources.len()))]
    pub async fn load(&self, provider: &str, sources: &[PactSource]) -> PactResult<LoadOutcome> {
        let mut outcome = LoadOutcome::default();

        for source in sources {
            let loaded = match self.fetcher.fetch(source).await {
                Ok(document) => Self::parse(&document, source.clone(), provider),
                Err(error) => Err(error),
            };
            match loaded {
                Ok(Some(pact)) => outcome.pacts.push(LoadedPact::new(pact)),
                Ok(None) => {}
                Err(error) => {
                    warn!(%source, %error, "failed to load pact");
                    outcome.failures.push(LoadFailure {
                        source: source.to_string(),
                        error,
                    });
                }
            }
        }

        if let Some((broker, request)) = &self.broker {
            for broker_pact in broker.fetch_pacts(provider, request).await? {
                let description = broker_pact.source.to_string();
                match Self::parse(&broker_pact.document, broker_pact.source, provider) {
                    Ok(Some(pact)) => outcome.pacts.push(LoadedPact {
                        pact,
                        pending: broker_pact.pending,
                        notices: broker_pact.notices,
                    }),
                    Ok(None) => {}
                    Err(error) => {
                        warn!(source = %description, %error, "failed to load pact");
                        outcome.failures.push(LoadFailure {
                            source: description,
                            error,
                        });
                    }
                }
            }
        }

        let interactions = outcome.interaction_count();
        if interactions == 0 {
            let reason = if self.broker.is_some() {
                format!("{} source(s) and the pact broker were searched", sources.len())
            } else {
                format!("{} source(s) were searched", sources.len())
            };
            if self.fail_if_no_pacts_found {
                return Err(PactError::no_pacts_found(provider, reason));
            }
            warn!(%reason, "no pacts found");
        } else {
            info!(pacts = outcome.pacts.len(), interactions, "pacts loaded");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::BrokerPact;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use test_utils::fixtures::{PROVIDER, v3_message_pact, v3_pact};

    struct InMemoryFetcher(HashMap<String, Vec<u8>>);

    #[async_trait]
    impl ContentFetcher for InMemoryFetcher {
        async fn fetch(&self, source: &PactSource) -> PactResult<Vec<u8>> {
            match source {
                PactSource::Url(url) => self
                    .0
                    .get(url)
                    .cloned()
                    .ok_or_else(|| PactError::invalid_pact(format!("{url} not found"))),
                _ => Err(PactError::config("unsupported")),
            }
        }
    }

    struct StaticBroker(Vec<BrokerPact>);

    #[async_trait]
    impl BrokerClient for StaticBroker {
        async fn fetch_pacts(&self, _provider: &str, _request: &PactsForVerificationRequest) -> PactResult<Vec<BrokerPact>> {
            Ok(self.0.clone())
        }
    }

    fn fetcher() -> Arc<dyn ContentFetcher> {
        let mut documents = HashMap::new();
        documents.insert("mem://orders".to_string(), serde_json::to_vec(&v3_pact()).unwrap());
        documents.insert("mem://events".to_string(), serde_json::to_vec(&v3_message_pact()).unwrap());
        documents.insert("mem://broken".to_string(), b"{\"consumer\": 1}".to_vec());
        Arc::new(InMemoryFetcher(documents))
    }

    fn url(u: &str) -> PactSource {
        PactSource::Url(u.to_string())
    }

    #[tokio::test]
    async fn test_invalid_sources_do_not_stop_the_load() {
        let outcome = PactLoader::new(fetcher())
            .load(PROVIDER, &[url("mem://broken"), url("mem://orders"), url("mem://events")])
            .await
            .unwrap();
        assert_eq!(outcome.pacts.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(outcome.failures[0].error, PactError::InvalidPact(_)));
        assert_eq!(outcome.pacts[0].pact.source(), &url("mem://orders"));
    }

    #[tokio::test]
    async fn test_other_providers_are_skipped() {
        let result = PactLoader::new(fetcher())
            .load("someone-else", &[url("mem://orders")])
            .await;
        assert!(matches!(result, Err(PactError::NoPactsFound { .. })));
    }

    #[tokio::test]
    async fn test_no_pacts_found_can_be_tolerated() {
        let outcome = PactLoader::new(fetcher())
            .with_fail_if_no_pacts_found(false)
            .load(PROVIDER, &[url("mem://missing")])
            .await
            .unwrap();
        assert!(outcome.pacts.is_empty());
        assert_eq!(outcome.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_broker_pacts_keep_pending_flag() {
        let broker = StaticBroker(vec![BrokerPact {
            document: serde_json::to_vec(&v3_pact()).unwrap(),
            source: PactSource::Broker {
                url: "https://broker.example.com".to_string(),
                consumer: "order-web".to_string(),
                provider: PROVIDER.to_string(),
                tags: vec!["main".to_string()],
                pending: true,
                wip: false,
            },
            pending: true,
            wip: false,
            notices: vec!["pending because it is new".to_string()],
        }]);
        let outcome = PactLoader::new(fetcher())
            .with_broker(Arc::new(broker), PactsForVerificationRequest::default())
            .load(PROVIDER, &[])
            .await
            .unwrap();
        assert_eq!(outcome.pacts.len(), 1);
        assert!(outcome.pacts[0].pending);
        assert_eq!(outcome.pacts[0].notices.len(), 1);
        assert_eq!(outcome.interaction_count(), 2);
    }
}

//! The verification driver.
//!
//! For each interaction: set up its provider states, generate the request
//! with the state parameters, replay it against the provider, compare the
//! answer and tear the states down again. One interaction failing never
//! stops the run.

use crate::client::{ProviderClient, StateChangeAction};
use crate::loader::LoadedPact;
use crate::message::MessageProvider;
use crate::report::{InteractionOutcome, InteractionResult, PactVerification, ProviderVersion, VerificationReport};
use pact_common::{PactError, PactResult};
use pact_matching::{MatchingConfig, generate_request, match_message, match_response};
use pact_models::provider_state::merged_params;
use pact_models::{GeneratorContext, Interaction, Message, ProviderState, RequestResponseInteraction};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Selects the interactions to verify.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionFilter {
    /// Keep interactions whose description contains this text
    pub description: Option<String>,
    /// Keep interactions with a provider state of this name
    pub provider_state: Option<String>,
}

impl InteractionFilter {
    /// Whether an interaction passes the filter.
    #[must_use]
    pub fn matches(&self, interaction: &Interaction) -> bool {
        let description_ok = self
            .description
            .as_deref()
            .is_none_or(|text| interaction.description().contains(text));
        let state_ok = self.provider_state.as_deref().is_none_or(|name| {
            interaction
                .provider_states()
                .iter()
                .any(|state| state.name == name)
        });
        description_ok && state_ok
    }
}

/// Verifies pacts against a running provider.
pub struct ProviderVerifier {
    provider: String,
    provider_version: Option<ProviderVersion>,
    client: Arc<dyn ProviderClient>,
    messages: Option<Arc<dyn MessageProvider>>,
    matching: MatchingConfig,
    filter: InteractionFilter,
}

impl ProviderVerifier {
    /// Create a verifier replaying HTTP interactions through `client`.
    #[must_use]
    pub fn new(provider: impl Into<String>, client: Arc<dyn ProviderClient>) -> Self {
        Self {
            provider: provider.into(),
            provider_version: None,
            client,
            messages: None,
            matching: MatchingConfig::new(),
            filter: InteractionFilter::default(),
        }
    }

    /// Produce actual messages for message pacts through `messages`.
    #[must_use]
    pub fn with_message_provider(mut self, messages: Arc<dyn MessageProvider>) -> Self {
        self.messages = Some(messages);
        self
    }

    /// Record the provider version in the report.
    #[must_use]
    pub fn with_provider_version(mut self, version: ProviderVersion) -> Self {
        self.provider_version = Some(version);
        self
    }

    /// Compare bodies with this matching configuration.
    #[must_use]
    pub fn with_matching_config(mut self, matching: MatchingConfig) -> Self {
        self.matching = matching;
        self
    }

    /// Only verify interactions passing the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: InteractionFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Verify every pact and build the report.
    #[instrument(skip_all, fields(provider = %self.provider, pacts = pacts.len()))]
    pub async fn verify(&self, pacts: &[LoadedPact]) -> VerificationReport {
        let mut report = VerificationReport::new(&self.provider, self.provider_version.clone());
        for loaded in pacts {
            report.pacts.push(self.verify_pact(loaded).await);
        }
        info!(
            interactions = report.interaction_count(),
            failures = report.failures().count(),
            success = report.success(),
            "verification finished"
        );
        report
    }

    /// Verify the interactions of one pact, in pact order.
    pub async fn verify_pact(&self, loaded: &LoadedPact) -> PactVerification {
        let pact = &loaded.pact;
        let mut interactions = Vec::new();
        for interaction in pact.interactions().iter().filter(|i| self.filter.matches(i)) {
            let outcome = match self.verify_interaction(interaction).await {
                Ok(mismatches) if mismatches.is_empty() => InteractionOutcome::Passed,
                Ok(mismatches) => InteractionOutcome::Failed(mismatches),
                Err(err) => {
                    error!(
                        description = interaction.description(),
                        fatal = err.is_fatal_for_interaction(),
                        error = %err,
                        "interaction could not be verified"
                    );
                    InteractionOutcome::Error(err.to_string())
                }
            };
            interactions.push(InteractionResult {
                description: interaction.description().to_string(),
                provider_state: interaction.display_state(),
                interaction_id: interaction.interaction_id().map(str::to_string),
                outcome,
            });
        }
        PactVerification {
            consumer: pact.consumer().name.clone(),
            source: pact.source().to_string(),
            pending: loaded.pending,
            notices: loaded.notices.clone(),
            interactions,
        }
    }

    async fn verify_interaction(&self, interaction: &Interaction) -> PactResult<Vec<pact_matching::Mismatch>> {
        let states = interaction.provider_states();
        for state in states {
            self.client.change_state(state, StateChangeAction::Setup).await?;
        }

        let result = match interaction {
            Interaction::RequestResponse(http) => self.verify_http(http, states).await,
            Interaction::Message(message) => self.verify_message(message).await,
        };

        for state in states.iter().rev() {
            if let Err(err) = self.client.change_state(state, StateChangeAction::Teardown).await {
                warn!(state = %state.name, error = %err, "provider state teardown failed");
            }
        }
        result
    }

    async fn verify_http(
        &self,
        interaction: &RequestResponseInteraction,
        states: &[ProviderState],
    ) -> PactResult<Vec<pact_matching::Mismatch>> {
        let context = GeneratorContext::provider(merged_params(states));
        let request = generate_request(&interaction.request, &context)?;
        let actual = self.client.make_request(&request).await?;
        Ok(match_response(&interaction.response, &actual, &self.matching))
    }

    async fn verify_message(&self, expected: &Message) -> PactResult<Vec<pact_matching::Mismatch>> {
        let messages = self
            .messages
            .as_ref()
            .ok_or_else(|| PactError::config("No message provider configured for a message pact"))?;
        let actual = messages.produce(expected).await?;
        Ok(match_message(expected, &actual, &self.matching))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageHandlers;
    use async_trait::async_trait;
    use pact_models::{OptionalBody, Pact, Request, Response};
    use serde_json::json;
    use std::sync::Mutex;
    use test_utils::fixtures::{v3_message_pact, v3_pact};

    /// Answers every request with a fixed response and records what it saw.
    struct CannedProvider {
        response: Response,
        seen: Mutex<Vec<String>>,
    }

    impl CannedProvider {
        fn new(response: Response) -> Self {
            Self {
                response,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ProviderClient for CannedProvider {
        async fn make_request(&self, request: &Request) -> PactResult<Response> {
            self.seen.lock().unwrap().push(format!("{} {}", request.method, request.path));
            Ok(self.response.clone())
        }

        async fn change_state(&self, state: &ProviderState, action: StateChangeAction) -> PactResult<()> {
            self.seen.lock().unwrap().push(format!("{} {}", action.as_str(), state.name));
            Ok(())
        }
    }

    fn order_response(id: i64) -> Response {
        Response::new(200)
            .with_header("Content-Type", "application/json")
            .with_body(OptionalBody::from_json(&json!({"id": id, "status": "closed", "created": "2024-02-01"})))
    }

    fn loaded(json: &serde_json::Value) -> LoadedPact {
        LoadedPact::new(Pact::from_json(json).unwrap())
    }

    #[tokio::test]
    async fn test_states_generators_and_order() {
        let provider = Arc::new(CannedProvider::new(order_response(10)));
        let verifier = ProviderVerifier::new("order-service", provider.clone()).with_filter(InteractionFilter {
            description: Some("request for an order".to_string()),
            provider_state: None,
        });

        let report = verifier.verify(&[loaded(&v3_pact())]).await;
        assert_eq!(report.interaction_count(), 1);
        assert!(report.success(), "{report}");
        assert_eq!(
            *provider.seen.lock().unwrap(),
            vec!["setup an order exists", "GET /orders/10", "teardown an order exists"]
        );
    }

    #[tokio::test]
    async fn test_mismatches_are_reported_per_interaction() {
        let provider = Arc::new(CannedProvider::new(Response::new(500)));
        let report = ProviderVerifier::new("order-service", provider)
            .verify(&[loaded(&v3_pact())])
            .await;
        assert!(!report.success());
        let results = &report.pacts[0].interactions;
        assert_eq!(results.len(), 2);
        assert!(matches!(&results[0].outcome, InteractionOutcome::Failed(m) if m.len() > 1));
        assert!(matches!(&results[1].outcome, InteractionOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_missing_provider_state_value_fails_only_that_interaction() {
        let mut document = v3_pact();
        document["interactions"][0]["providerStates"] = json!([{"name": "an order exists"}]);
        let provider = Arc::new(CannedProvider::new(Response::new(201)));
        let report = ProviderVerifier::new("order-service", provider.clone())
            .verify(&[loaded(&document)])
            .await;

        let results = &report.pacts[0].interactions;
        assert!(matches!(&results[0].outcome, InteractionOutcome::Error(msg) if msg.contains("orderId")));
        assert_eq!(results[1].outcome, InteractionOutcome::Passed);
        // teardown still ran for the failed interaction
        assert!(provider.seen.lock().unwrap().contains(&"teardown an order exists".to_string()));
    }

    #[tokio::test]
    async fn test_message_pacts() {
        let handlers = MessageHandlers::new().with_handler("an order created event", |_| {
            Ok(Message::new("an order created event")
                .with_contents(OptionalBody::from_json(&json!({"orderId": 99, "total": 3.25})))
                .with_metadata("contentType", json!("application/json"))
                .with_metadata("topic", json!("orders")))
        });
        let provider = Arc::new(CannedProvider::new(Response::new(200)));
        let verifier = ProviderVerifier::new("order-service", provider.clone());

        let report = verifier.verify(&[loaded(&v3_message_pact())]).await;
        assert!(!report.success(), "no message provider configured");

        let report = verifier
            .with_message_provider(Arc::new(handlers))
            .verify(&[loaded(&v3_message_pact())])
            .await;
        assert!(report.success(), "{report}");
    }

    #[test]
    fn test_filter_by_provider_state() {
        let pact = Pact::from_json(&v3_pact()).unwrap();
        let filter = InteractionFilter {
            description: None,
            provider_state: Some("an order exists".to_string()),
        };
        let kept: Vec<_> = pact.interactions().into_iter().filter(|i| filter.matches(i)).collect();
        assert_eq!(kept.len(), 1);
        assert!(InteractionFilter::default().matches(&kept[0]));
    }
}

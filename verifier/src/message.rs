//! Producing actual messages for message pacts.

use async_trait::async_trait;
use pact_common::{PactError, PactResult};
use pact_models::{Message, ProviderState};
use std::collections::BTreeMap;
use std::fmt;

/// Produces the message the provider would publish for an expected one.
#[async_trait]
pub trait MessageProvider: Send + Sync {
    /// Produce the actual message for an expected message.
    async fn produce(&self, expected: &Message) -> PactResult<Message>;
}

type Handler = Box<dyn Fn(&[ProviderState]) -> PactResult<Message> + Send + Sync>;

/// [`MessageProvider`] dispatching on the message description.
#[derive(Default)]
pub struct MessageHandlers {
    handlers: BTreeMap<String, Handler>,
}

impl fmt::Debug for MessageHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageHandlers")
            .field("descriptions", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MessageHandlers {
    /// Create an empty handler set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the producer for messages with this description. The
    /// producer receives the provider states of the expected message.
    #[must_use]
    pub fn with_handler<F>(mut self, description: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&[ProviderState]) -> PactResult<Message> + Send + Sync + 'static,
    {
        self.handlers.insert(description.into(), Box::new(handler));
        self
    }
}

#[async_trait]
impl MessageProvider for MessageHandlers {
    async fn produce(&self, expected: &Message) -> PactResult<Message> {
        let handler = self.handlers.get(&expected.description).ok_or_else(|| {
            PactError::config(format!(
                "No message handler registered for '{}'",
                expected.description
            ))
        })?;
        handler(&expected.provider_states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pact_models::OptionalBody;
    use serde_json::json;

    #[tokio::test]
    async fn test_dispatch_by_description() {
        let handlers = MessageHandlers::new().with_handler("an order created event", |states| {
            assert_eq!(states.len(), 1);
            Ok(Message::new("an order created event")
                .with_contents(OptionalBody::from_json(&json!({"orderId": 11}))))
        });
        let expected = Message::new("an order created event").with_provider_state(ProviderState::new("an order"));

        let actual = handlers.produce(&expected).await.unwrap();
        assert!(actual.contents.is_present());
        assert!(handlers.produce(&Message::new("unknown")).await.is_err());
    }
}

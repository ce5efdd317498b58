//! EventHandler and routing ports for the delivery side of the pipeline.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// A consumer of domain events.
///
/// Handlers are invoked with at-least-once semantics and must be idempotent;
/// wrap them in `IdempotentHandler` unless the handler is naturally so.
/// Within one event type, handlers must be commutative: invocation order is
/// not guaranteed.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Process one event envelope.
    async fn handle(&self, envelope: EventEnvelope) -> Result<(), DomainError>;

    /// Stable handler name, used as the idempotency discriminator.
    fn name(&self) -> &'static str;
}

/// Registration of handlers by event type.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe a handler to one event type.
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>);

    /// Subscribe a handler to several event types at once.
    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>) {
        for event_type in event_types {
            self.subscribe(event_type, Arc::clone(&handler));
        }
    }
}

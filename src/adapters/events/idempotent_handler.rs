//! IdempotentHandler - at-most-once wrapper around any `EventHandler`.
//!
//! The queue worker delivers at-least-once; this decorator checks a
//! `ProcessedEventStore` keyed by (event id, handler name) before invoking
//! the inner handler and records completion afterwards. A failing inner
//! handler is not recorded, so the next delivery retries it.

use async_trait::async_trait;
use std::sync::Arc;

use tracing::debug;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::{EventHandler, ProcessedEventStore};

/// Wrapper that ensures at-most-once event processing per handler.
pub struct IdempotentHandler<H: EventHandler> {
    inner: H,
    processed_events: Arc<dyn ProcessedEventStore>,
}

impl<H: EventHandler> IdempotentHandler<H> {
    pub fn new(inner: H, processed_events: Arc<dyn ProcessedEventStore>) -> Self {
        Self {
            inner,
            processed_events,
        }
    }
}

#[async_trait]
impl<H: EventHandler + 'static> EventHandler for IdempotentHandler<H> {
    async fn handle(&self, envelope: EventEnvelope) -> Result<(), DomainError> {
        let handler_name = self.inner.name();

        if self
            .processed_events
            .contains(&envelope.event_id, handler_name)
            .await?
        {
            debug!(
                event_id = %envelope.event_id,
                handler = handler_name,
                "skipping duplicate event"
            );
            return Ok(());
        }

        self.inner.handle(envelope.clone()).await?;

        self.processed_events
            .mark_processed(&envelope.event_id, handler_name)
            .await?;

        Ok(())
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

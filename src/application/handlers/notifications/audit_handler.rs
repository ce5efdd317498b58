//! AuditHandler - structured audit trail for registration lifecycle events.
//!
//! Asynchronous consumer of every outbox-delivered event. Emits one
//! structured log entry per event under the `audit` target; shipping those
//! entries somewhere durable is the logging pipeline's concern.

use async_trait::async_trait;
use tracing::info;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::EventHandler;

/// Writes audit entries for domain events.
#[derive(Default)]
pub struct AuditHandler;

impl AuditHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventHandler for AuditHandler {
    async fn handle(&self, envelope: EventEnvelope) -> Result<(), DomainError> {
        info!(
            target: "audit",
            action = %envelope.event_type,
            entity_type = %envelope.aggregate_type,
            entity_id = %envelope.aggregate_id,
            user_id = envelope.metadata.user_id.as_deref().unwrap_or("-"),
            correlation_id = envelope.metadata.correlation_id.as_deref().unwrap_or("-"),
            metadata = %envelope.payload,
            ts = %envelope.occurred_at,
            "domain event"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "AuditHandler"
    }
}

//! ProcessedEventStore port - per-handler event dedup for at-least-once
//! delivery.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventId, Timestamp};

/// Port tracking which (event, handler) pairs have completed.
///
/// Backs `IdempotentHandler`: the queue worker redelivers on retry, the
/// store ensures each handler's side effect happens once.
#[async_trait]
pub trait ProcessedEventStore: Send + Sync {
    /// Has this handler already processed this event?
    async fn contains(&self, event_id: &EventId, handler_name: &str)
        -> Result<bool, DomainError>;

    /// Record successful processing.
    async fn mark_processed(
        &self,
        event_id: &EventId,
        handler_name: &str,
    ) -> Result<(), DomainError>;

    /// Drop records older than `before` (retention). Returns rows removed.
    async fn purge_before(&self, before: Timestamp) -> Result<u64, DomainError>;
}

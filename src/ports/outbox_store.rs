//! OutboxStore port - durable queue of pending domain events.
//!
//! Rows are written in the same transaction as the state change that raised
//! them (see `RegistrationStore`); this port covers the worker side: atomic
//! claiming, completion, retry scheduling, dead-lettering, and retention.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::{DomainError, EventEnvelope, Timestamp};

/// Delivery status of an outbox row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    /// Written, not yet picked up.
    Pending,
    /// Claimed by a worker; released by the stuck-sweep if the worker dies.
    Claimed,
    /// Delivered to every handler.
    Processed,
    /// Delivery failed. Retryable while `try_count < max_tries`; dead
    /// (excluded from claims) once the budget is exhausted.
    Failed,
}

/// An entry in the outbox table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub created_at: Timestamp,
    /// Fully qualified event type (mirrors `envelope.event_type`).
    pub event_type: String,
    /// The serialized domain event envelope.
    pub envelope: EventEnvelope,
    /// When the domain event occurred.
    pub occurred_on: Timestamp,
    pub status: OutboxStatus,
    pub try_count: i32,
    pub last_error: Option<String>,
    pub next_attempt_at: Option<Timestamp>,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<Timestamp>,
}

impl OutboxMessage {
    /// Wraps an envelope into a fresh pending row.
    pub fn pending(envelope: EventEnvelope) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Timestamp::now(),
            event_type: envelope.event_type.clone(),
            occurred_on: envelope.occurred_at,
            envelope,
            status: OutboxStatus::Pending,
            try_count: 0,
            last_error: None,
            next_attempt_at: None,
            claimed_by: None,
            claimed_at: None,
        }
    }
}

/// Port for the outbox table.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Append rows outside a store transaction (dev/test path; production
    /// writes happen inside `RegistrationStore` transactions).
    async fn enqueue(&self, envelopes: &[EventEnvelope]) -> Result<(), DomainError>;

    /// Atomically claim up to `limit` due rows for `claimed_by`.
    ///
    /// A row is due when Pending, or Failed with remaining retry budget and
    /// `next_attempt_at <= now`. Claimed rows are marked Claimed in the same
    /// statement (`FOR UPDATE SKIP LOCKED`), so concurrent workers never
    /// overlap.
    async fn claim_batch(
        &self,
        limit: u32,
        claimed_by: &str,
        max_tries: i32,
    ) -> Result<Vec<OutboxMessage>, DomainError>;

    /// Mark a row fully delivered.
    async fn mark_processed(&self, id: Uuid) -> Result<(), DomainError>;

    /// Record a failed attempt. Sets Failed, increments `try_count`, stores
    /// the error, and schedules `next_attempt_at`; once `try_count` reaches
    /// the worker's budget the row simply never becomes due again (the DLQ).
    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        next_attempt_at: Timestamp,
    ) -> Result<(), DomainError>;

    /// Release rows claimed longer than `claimed_before` back to Pending
    /// (worker died mid-batch). Returns the number released.
    async fn release_stuck(&self, claimed_before: Timestamp) -> Result<u64, DomainError>;

    /// Delete Processed rows older than `older_than`. Returns rows deleted.
    async fn delete_processed_before(&self, older_than: Timestamp) -> Result<u64, DomainError>;

    /// Rows that exhausted their retry budget (the dead-letter view).
    async fn dead_letters(&self, limit: u32, max_tries: i32)
        -> Result<Vec<OutboxMessage>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_row_mirrors_envelope() {
        let envelope = EventEnvelope::test_fixture();
        let row = OutboxMessage::pending(envelope.clone());

        assert_eq!(row.status, OutboxStatus::Pending);
        assert_eq!(row.event_type, envelope.event_type);
        assert_eq!(row.occurred_on, envelope.occurred_at);
        assert_eq!(row.try_count, 0);
        assert!(row.claimed_by.is_none());
    }
}

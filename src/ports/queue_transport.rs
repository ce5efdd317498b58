//! QueueTransport port - the external queue between outbox and consumers.
//!
//! The wire payload is `{ "event_type": ..., "payload": ... }`; the envelope
//! serializes to exactly that shape plus identification metadata. The
//! in-memory transport backs single-node dev; the redis transport backs
//! cross-instance fan-out with a dead-letter list.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing outbox payloads to the configured transport.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Push one envelope onto the queue.
    async fn send(&self, envelope: &EventEnvelope) -> Result<(), DomainError>;

    /// Push one envelope onto the dead-letter queue after the retry budget
    /// is exhausted.
    async fn send_dead_letter(&self, envelope: &EventEnvelope) -> Result<(), DomainError>;
}

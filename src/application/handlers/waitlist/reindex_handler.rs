//! ReindexHandler - compacts waitlist positions to a contiguous 1..N.
//!
//! Synchronous consumer of `waitlist.removed.v1`. When the removal was a
//! cancellation, the promotion handler has usually compacted the queue
//! already and this pass finds nothing; it exists so a removal is never
//! left with a gap regardless of which trigger fired first.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::dispatcher::SyncEventHandler;
use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::domain::registration::WaitlistRemoval;
use crate::ports::RegistrationStore;

use super::promotion_handler::caused_by;

/// Synchronous reindex pass.
pub struct ReindexHandler {
    store: Arc<dyn RegistrationStore>,
}

impl ReindexHandler {
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SyncEventHandler for ReindexHandler {
    async fn handle(&self, envelope: &EventEnvelope) -> Result<Vec<EventEnvelope>, DomainError> {
        let event: WaitlistRemoval = envelope.payload_as().map_err(|e| {
            DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Undecodable waitlist removal payload: {}", e),
            )
        })?;

        let outcome = self
            .store
            .reindex(event.live_event_id, caused_by(envelope))
            .await?;
        Ok(outcome.events.synchronous)
    }

    fn name(&self) -> &'static str {
        "ReindexHandler"
    }
}

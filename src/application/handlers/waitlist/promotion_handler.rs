//! PromotionHandler - fills freed seats from the waitlist.
//!
//! Synchronous consumer of `registration.cancelled.v1` and
//! `event.capacity_increased.v1`. The only handler allowed to mutate
//! registrations other than the requester's: it runs the store's promotion
//! transaction under the event's advisory lock. Running it twice against
//! the same cancellation is harmless; the second pass finds no free seat
//! and no gap.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::dispatcher::SyncEventHandler;
use crate::application::Metrics;
use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope, EventMetadata, LiveEventId};
use crate::domain::live_event::EventCapacityIncreased;
use crate::domain::registration::RegistrationCancelled;
use crate::ports::RegistrationStore;

/// Derives the metadata for follow-up events caused by `envelope`.
pub(super) fn caused_by(envelope: &EventEnvelope) -> EventMetadata {
    EventMetadata {
        correlation_id: envelope.metadata.correlation_id.clone(),
        causation_id: Some(envelope.event_id.to_string()),
        user_id: envelope.metadata.user_id.clone(),
    }
}

/// Synchronous promotion pass.
pub struct PromotionHandler {
    store: Arc<dyn RegistrationStore>,
    metrics: Arc<Metrics>,
}

impl PromotionHandler {
    pub fn new(store: Arc<dyn RegistrationStore>, metrics: Arc<Metrics>) -> Self {
        Self { store, metrics }
    }

    fn live_event_id(envelope: &EventEnvelope) -> Result<LiveEventId, DomainError> {
        match envelope.event_type.as_str() {
            "registration.cancelled.v1" => {
                let event: RegistrationCancelled = envelope.payload_as().map_err(decode_err)?;
                Ok(event.live_event_id)
            }
            "event.capacity_increased.v1" => {
                let event: EventCapacityIncreased = envelope.payload_as().map_err(decode_err)?;
                Ok(event.live_event_id)
            }
            other => Err(DomainError::new(
                ErrorCode::InternalError,
                format!("PromotionHandler routed an unexpected event: {}", other),
            )),
        }
    }
}

fn decode_err(e: serde_json::Error) -> DomainError {
    DomainError::new(
        ErrorCode::InvalidFormat,
        format!("Undecodable promotion trigger payload: {}", e),
    )
}

#[async_trait]
impl SyncEventHandler for PromotionHandler {
    async fn handle(&self, envelope: &EventEnvelope) -> Result<Vec<EventEnvelope>, DomainError> {
        let live_event_id = Self::live_event_id(envelope)?;

        let outcome = self
            .store
            .promote(live_event_id, caused_by(envelope))
            .await?;

        if !outcome.promoted.is_empty() {
            self.metrics.incr_promotions(outcome.promoted.len() as u64);
        }
        Ok(outcome.events.synchronous)
    }

    fn name(&self) -> &'static str {
        "PromotionHandler"
    }
}

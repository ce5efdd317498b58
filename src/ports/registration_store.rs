//! RegistrationStore port - transactional writes on the registration set.
//!
//! Every operation here runs as one database transaction holding the
//! event's advisory lock (`pg_advisory_xact_lock` keyed by the event id),
//! applies a plan computed by the pure planners in
//! `domain::registration::waitlist`, and writes the resulting outbox rows
//! atomically with the state change. That transaction is the single
//! mechanism behind the outbox guarantee: no event without a committed
//! change, no committed change without its events.

use async_trait::async_trait;

use crate::domain::foundation::{
    DomainError, EventEnvelope, EventMetadata, LiveEventId, RegistrationId, UserId,
};
use crate::domain::live_event::LiveEvent;
use crate::domain::registration::Registration;

/// Events produced by a store operation, split by delivery pipeline.
///
/// `queued` envelopes were written to the outbox inside the transaction and
/// will reach handlers through the queue worker. `synchronous` envelopes
/// must be dispatched in-process by the caller before the command returns.
#[derive(Debug, Clone, Default)]
pub struct EmittedEvents {
    pub synchronous: Vec<EventEnvelope>,
    pub queued: Vec<EventEnvelope>,
}

impl EmittedEvents {
    pub fn is_empty(&self) -> bool {
        self.synchronous.is_empty() && self.queued.is_empty()
    }
}

/// Result of an admission (register) transaction.
#[derive(Debug, Clone)]
pub struct AdmissionOutcome {
    pub registration: Registration,
    pub events: EmittedEvents,
}

/// Result of a cancellation transaction.
#[derive(Debug, Clone)]
pub struct CancellationOutcome {
    pub registration: Registration,
    pub events: EmittedEvents,
}

/// Result of a promotion / confirm / reindex transaction.
#[derive(Debug, Clone, Default)]
pub struct PromotionOutcome {
    /// Registrations promoted to Confirmed, in promotion order.
    pub promoted: Vec<Registration>,
    pub events: EmittedEvents,
}

/// Port for the transactional registration write paths.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Admit a user to an event: Confirmed while seats remain, Waitlisted at
    /// `max(position)+1` once full. Enforces the one-active-registration-per
    /// (event, user) rule inside the transaction.
    ///
    /// # Errors
    ///
    /// - `DuplicateRegistration` if a non-cancelled row already exists
    async fn admit(
        &self,
        event: &LiveEvent,
        user_id: UserId,
        notes: Option<String>,
        metadata: EventMetadata,
    ) -> Result<AdmissionOutcome, DomainError>;

    /// Cancel a registration. Emits `registration.cancelled.v1` and, when
    /// the row was waitlisted, `waitlist.removed.v1` (both synchronous).
    ///
    /// # Errors
    ///
    /// - `RegistrationNotFound`
    /// - `InvalidStateTransition` if already cancelled
    async fn cancel(
        &self,
        registration_id: RegistrationId,
        metadata: EventMetadata,
    ) -> Result<CancellationOutcome, DomainError>;

    /// Run a promotion pass: fill free seats from the queue front, compact
    /// the remainder. `registration.promoted.v1` rows go to the outbox;
    /// `waitlist.position_changed.v1` events come back for sync dispatch.
    async fn promote(
        &self,
        live_event_id: LiveEventId,
        metadata: EventMetadata,
    ) -> Result<PromotionOutcome, DomainError>;

    /// Admin confirm of one specific Pending/Waitlisted row, out of queue
    /// order, followed by a compaction of the remaining queue.
    ///
    /// # Errors
    ///
    /// - `RegistrationNotFound`
    /// - `InvalidStateTransition` unless the row is Pending or Waitlisted
    async fn confirm(
        &self,
        registration_id: RegistrationId,
        metadata: EventMetadata,
    ) -> Result<PromotionOutcome, DomainError>;

    /// Reindex the event's waitlist to contiguous positions 1..=N.
    async fn reindex(
        &self,
        live_event_id: LiveEventId,
        metadata: EventMetadata,
    ) -> Result<PromotionOutcome, DomainError>;

    /// Load one registration row.
    async fn find_registration(
        &self,
        registration_id: &RegistrationId,
    ) -> Result<Option<Registration>, DomainError>;
}

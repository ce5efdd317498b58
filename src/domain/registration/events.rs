//! Domain events emitted by the registration lifecycle.
//!
//! Sync-routed events (`registration.cancelled.v1`,
//! `waitlist.removed.v1`, `waitlist.position_changed.v1`) drive the
//! promotion/reindex handlers before the originating command returns;
//! the rest travel through the outbox.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EventId, LiveEventId, RegistrationId, Timestamp, UserId};
use crate::domain_event;

use super::RegistrationStatus;

/// A registration row was created (confirmed or waitlisted).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationCreated {
    pub event_id: EventId,
    pub registration_id: RegistrationId,
    pub live_event_id: LiveEventId,
    pub user_id: UserId,
    pub status: RegistrationStatus,
    pub occurred_at: Timestamp,
}

domain_event!(
    RegistrationCreated,
    event_type = "registration.created.v1",
    aggregate_id = registration_id,
    aggregate_type = "Registration",
    occurred_at = occurred_at,
    event_id = event_id
);

/// The event was full; the registration entered the waitlist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationWaitlisted {
    pub event_id: EventId,
    pub registration_id: RegistrationId,
    pub live_event_id: LiveEventId,
    pub user_id: UserId,
    pub position: i32,
    pub occurred_at: Timestamp,
}

domain_event!(
    RegistrationWaitlisted,
    event_type = "registration.waitlisted.v1",
    aggregate_id = registration_id,
    aggregate_type = "Registration",
    occurred_at = occurred_at,
    event_id = event_id
);

/// A registration was cancelled (by the user or an admin).
///
/// Synchronous: triggers the promotion handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationCancelled {
    pub event_id: EventId,
    pub registration_id: RegistrationId,
    pub live_event_id: LiveEventId,
    pub user_id: UserId,
    /// Status the row held before cancellation.
    pub previous_status: RegistrationStatus,
    pub occurred_at: Timestamp,
}

domain_event!(
    RegistrationCancelled,
    event_type = "registration.cancelled.v1",
    aggregate_id = registration_id,
    aggregate_type = "Registration",
    occurred_at = occurred_at,
    event_id = event_id
);

/// A waitlisted row left the queue, leaving a gap at `freed_position`.
///
/// Synchronous: triggers the reindex handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistRemoval {
    pub event_id: EventId,
    pub registration_id: RegistrationId,
    pub live_event_id: LiveEventId,
    pub user_id: UserId,
    pub freed_position: i32,
    pub occurred_at: Timestamp,
}

domain_event!(
    WaitlistRemoval,
    event_type = "waitlist.removed.v1",
    aggregate_id = registration_id,
    aggregate_type = "Registration",
    occurred_at = occurred_at,
    event_id = event_id
);

/// A registration was promoted off the waitlist (or admin-confirmed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationPromoted {
    pub event_id: EventId,
    pub registration_id: RegistrationId,
    pub live_event_id: LiveEventId,
    pub user_id: UserId,
    /// Waitlist position the row held before promotion, if any.
    pub previous_position: Option<i32>,
    pub occurred_at: Timestamp,
}

domain_event!(
    RegistrationPromoted,
    event_type = "registration.promoted.v1",
    aggregate_id = registration_id,
    aggregate_type = "Registration",
    occurred_at = occurred_at,
    event_id = event_id
);

/// A waitlisted row moved to a new position during reindexing.
///
/// Synchronous: position notifications must preserve ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistPositionChanged {
    pub event_id: EventId,
    pub registration_id: RegistrationId,
    pub live_event_id: LiveEventId,
    pub user_id: UserId,
    pub old_position: i32,
    pub new_position: i32,
    pub occurred_at: Timestamp,
}

domain_event!(
    WaitlistPositionChanged,
    event_type = "waitlist.position_changed.v1",
    aggregate_id = registration_id,
    aggregate_type = "Registration",
    occurred_at = occurred_at,
    event_id = event_id
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::SerializableDomainEvent;

    #[test]
    fn created_event_envelope_carries_status() {
        let event = RegistrationCreated {
            event_id: EventId::new(),
            registration_id: RegistrationId::new(),
            live_event_id: LiveEventId::new(),
            user_id: UserId::new(),
            status: RegistrationStatus::Confirmed,
            occurred_at: Timestamp::now(),
        };
        let envelope = event.to_envelope();
        assert_eq!(envelope.event_type, "registration.created.v1");
        assert_eq!(envelope.payload["status"], "confirmed");
    }

    #[test]
    fn position_changed_envelope_round_trips() {
        let event = WaitlistPositionChanged {
            event_id: EventId::new(),
            registration_id: RegistrationId::new(),
            live_event_id: LiveEventId::new(),
            user_id: UserId::new(),
            old_position: 3,
            new_position: 2,
            occurred_at: Timestamp::now(),
        };
        let envelope = event.to_envelope();
        let restored: WaitlistPositionChanged = envelope.payload_as().unwrap();
        assert_eq!(restored.old_position, 3);
        assert_eq!(restored.new_position, 2);
    }
}

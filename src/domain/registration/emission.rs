//! Builders turning registration state changes into event envelopes.
//!
//! Both store implementations (postgres, in-memory) construct the same
//! events from the same plans; keeping the construction here guarantees the
//! two backends emit identical payloads.

use crate::domain::foundation::{
    EventEnvelope, EventId, EventMetadata, LiveEventId, SerializableDomainEvent, Timestamp,
};

use super::waitlist::{PositionChange, WaitlistEntry};
use super::{
    Registration, RegistrationCancelled, RegistrationCreated, RegistrationPromoted,
    RegistrationStatus, RegistrationWaitlisted, WaitlistPositionChanged, WaitlistRemoval,
};

/// Events for a freshly admitted registration: `registration.created.v1`,
/// plus `registration.waitlisted.v1` when the row entered the queue.
/// Both travel through the outbox.
pub fn admission_envelopes(
    registration: &Registration,
    metadata: &EventMetadata,
) -> Vec<EventEnvelope> {
    let occurred_at = *registration.registered_at();
    let mut envelopes = vec![RegistrationCreated {
        event_id: EventId::new(),
        registration_id: *registration.id(),
        live_event_id: *registration.live_event_id(),
        user_id: *registration.user_id(),
        status: registration.status(),
        occurred_at,
    }
    .to_envelope()
    .with_metadata(metadata.clone())];

    if let Some(position) = registration.position_in_queue() {
        envelopes.push(
            RegistrationWaitlisted {
                event_id: EventId::new(),
                registration_id: *registration.id(),
                live_event_id: *registration.live_event_id(),
                user_id: *registration.user_id(),
                position,
                occurred_at,
            }
            .to_envelope()
            .with_metadata(metadata.clone()),
        );
    }

    envelopes
}

/// Synchronous events for a cancellation: `registration.cancelled.v1`, plus
/// `waitlist.removed.v1` when the row held a queue position.
pub fn cancellation_envelopes(
    registration: &Registration,
    previous_status: RegistrationStatus,
    freed_position: Option<i32>,
    metadata: &EventMetadata,
) -> Vec<EventEnvelope> {
    let occurred_at = *registration.updated_at();
    let mut envelopes = vec![RegistrationCancelled {
        event_id: EventId::new(),
        registration_id: *registration.id(),
        live_event_id: *registration.live_event_id(),
        user_id: *registration.user_id(),
        previous_status,
        occurred_at,
    }
    .to_envelope()
    .with_metadata(metadata.clone())];

    if let Some(freed_position) = freed_position {
        envelopes.push(
            WaitlistRemoval {
                event_id: EventId::new(),
                registration_id: *registration.id(),
                live_event_id: *registration.live_event_id(),
                user_id: *registration.user_id(),
                freed_position,
                occurred_at,
            }
            .to_envelope()
            .with_metadata(metadata.clone()),
        );
    }

    envelopes
}

/// Outbox-bound `registration.promoted.v1` for one promoted row.
pub fn promoted_envelope(
    live_event_id: LiveEventId,
    entry: &WaitlistEntry,
    occurred_at: Timestamp,
    metadata: &EventMetadata,
) -> EventEnvelope {
    RegistrationPromoted {
        event_id: EventId::new(),
        registration_id: entry.registration_id,
        live_event_id,
        user_id: entry.user_id,
        previous_position: Some(entry.position),
        occurred_at,
    }
    .to_envelope()
    .with_metadata(metadata.clone())
}

/// Outbox-bound `registration.promoted.v1` for an admin confirm of a row
/// that was not waitlisted (Pending).
pub fn confirmed_envelope(
    registration: &Registration,
    previous_position: Option<i32>,
    metadata: &EventMetadata,
) -> EventEnvelope {
    RegistrationPromoted {
        event_id: EventId::new(),
        registration_id: *registration.id(),
        live_event_id: *registration.live_event_id(),
        user_id: *registration.user_id(),
        previous_position,
        occurred_at: *registration.updated_at(),
    }
    .to_envelope()
    .with_metadata(metadata.clone())
}

/// Synchronous `waitlist.position_changed.v1` for one queue move.
pub fn position_changed_envelope(
    live_event_id: LiveEventId,
    change: &PositionChange,
    occurred_at: Timestamp,
    metadata: &EventMetadata,
) -> EventEnvelope {
    WaitlistPositionChanged {
        event_id: EventId::new(),
        registration_id: change.registration_id,
        live_event_id,
        user_id: change.user_id,
        old_position: change.old_position,
        new_position: change.new_position,
        occurred_at,
    }
    .to_envelope()
    .with_metadata(metadata.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{RegistrationId, UserId};

    #[test]
    fn admission_of_confirmed_row_emits_created_only() {
        let reg = Registration::confirmed(
            RegistrationId::new(),
            LiveEventId::new(),
            UserId::new(),
            None,
        );
        let envelopes = admission_envelopes(&reg, &EventMetadata::default());
        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].event_type, "registration.created.v1");
    }

    #[test]
    fn admission_of_waitlisted_row_also_emits_waitlisted() {
        let reg = Registration::waitlisted(
            RegistrationId::new(),
            LiveEventId::new(),
            UserId::new(),
            2,
            None,
        );
        let envelopes = admission_envelopes(&reg, &EventMetadata::default());
        assert_eq!(envelopes.len(), 2);
        assert_eq!(envelopes[1].event_type, "registration.waitlisted.v1");
        assert_eq!(envelopes[1].payload["position"], 2);
    }

    #[test]
    fn cancellation_of_waitlisted_row_emits_removal() {
        let mut reg = Registration::waitlisted(
            RegistrationId::new(),
            LiveEventId::new(),
            UserId::new(),
            1,
            None,
        );
        let previous = reg.status();
        let freed = reg.cancel().unwrap();

        let envelopes = cancellation_envelopes(&reg, previous, freed, &EventMetadata::default());
        assert_eq!(envelopes.len(), 2);
        assert_eq!(envelopes[0].event_type, "registration.cancelled.v1");
        assert_eq!(envelopes[1].event_type, "waitlist.removed.v1");
        assert_eq!(envelopes[1].payload["freed_position"], 1);
    }

    #[test]
    fn metadata_is_propagated_onto_envelopes() {
        let reg = Registration::confirmed(
            RegistrationId::new(),
            LiveEventId::new(),
            UserId::new(),
            None,
        );
        let metadata = EventMetadata {
            correlation_id: Some("corr-7".to_string()),
            ..Default::default()
        };
        let envelopes = admission_envelopes(&reg, &metadata);
        assert_eq!(
            envelopes[0].metadata.correlation_id,
            Some("corr-7".to_string())
        );
    }
}

//! NotifierHandler - subscriber fan-out for registration lifecycle events.
//!
//! Asynchronous consumer of the outbox-delivered events
//! (`registration.created.v1`, `registration.waitlisted.v1`,
//! `registration.promoted.v1`). Publishes the per-event topic payload;
//! duplicates arriving from at-least-once delivery are absorbed by the
//! `IdempotentHandler` wrapper and by the payload's dedup key on the
//! subscriber side.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope, LiveEventId, RegistrationId, Timestamp, UserId};
use crate::domain::registration::{
    RegistrationCreated, RegistrationPromoted, RegistrationStatus, RegistrationWaitlisted,
};
use crate::ports::{
    EventHandler, LiveEventReader, NotificationPublisher, RegistrationAction,
    RegistrationNotification, UserRepository,
};

struct NotificationSeed {
    live_event_id: LiveEventId,
    registration_id: RegistrationId,
    user_id: UserId,
    action: RegistrationAction,
    occurred_at: Timestamp,
}

/// Publishes registration notifications to subscribers.
pub struct NotifierHandler {
    events: Arc<dyn LiveEventReader>,
    users: Arc<dyn UserRepository>,
    publisher: Arc<dyn NotificationPublisher>,
}

impl NotifierHandler {
    pub fn new(
        events: Arc<dyn LiveEventReader>,
        users: Arc<dyn UserRepository>,
        publisher: Arc<dyn NotificationPublisher>,
    ) -> Self {
        Self {
            events,
            users,
            publisher,
        }
    }

    fn seed(envelope: &EventEnvelope) -> Result<NotificationSeed, DomainError> {
        let decode = |e: serde_json::Error| {
            DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Undecodable notification payload: {}", e),
            )
        };

        match envelope.event_type.as_str() {
            "registration.created.v1" => {
                let event: RegistrationCreated = envelope.payload_as().map_err(decode)?;
                let action = if event.status == RegistrationStatus::Waitlisted {
                    RegistrationAction::Waitlisted
                } else {
                    RegistrationAction::Registered
                };
                Ok(NotificationSeed {
                    live_event_id: event.live_event_id,
                    registration_id: event.registration_id,
                    user_id: event.user_id,
                    action,
                    occurred_at: event.occurred_at,
                })
            }
            "registration.waitlisted.v1" => {
                let event: RegistrationWaitlisted = envelope.payload_as().map_err(decode)?;
                Ok(NotificationSeed {
                    live_event_id: event.live_event_id,
                    registration_id: event.registration_id,
                    user_id: event.user_id,
                    action: RegistrationAction::Waitlisted,
                    occurred_at: event.occurred_at,
                })
            }
            "registration.promoted.v1" => {
                let event: RegistrationPromoted = envelope.payload_as().map_err(decode)?;
                Ok(NotificationSeed {
                    live_event_id: event.live_event_id,
                    registration_id: event.registration_id,
                    user_id: event.user_id,
                    action: RegistrationAction::Promoted,
                    occurred_at: event.occurred_at,
                })
            }
            other => Err(DomainError::new(
                ErrorCode::InternalError,
                format!("NotifierHandler routed an unexpected event: {}", other),
            )),
        }
    }
}

#[async_trait]
impl EventHandler for NotifierHandler {
    async fn handle(&self, envelope: EventEnvelope) -> Result<(), DomainError> {
        let seed = Self::seed(&envelope)?;

        let (live_event, user) = tokio::join!(
            self.events.get(&seed.live_event_id),
            self.users.find_by_id(&seed.user_id)
        );

        // Aggregates can only be missing in pathological states; retrying
        // will not bring them back, so skip rather than spin.
        let Some(live_event) = live_event? else {
            warn!(event_id = %seed.live_event_id, "notification for unknown event; skipping");
            return Ok(());
        };
        let Some(user) = user? else {
            warn!(user_id = %seed.user_id, "notification for unknown user; skipping");
            return Ok(());
        };

        self.publisher
            .publish(RegistrationNotification {
                event_id: seed.live_event_id,
                event_title: live_event.name().to_string(),
                registration_id: seed.registration_id,
                user_id: seed.user_id,
                user_name: user.display_name(),
                action: seed.action,
                timestamp: seed.occurred_at,
            })
            .await
    }

    fn name(&self) -> &'static str {
        "NotifierHandler"
    }
}

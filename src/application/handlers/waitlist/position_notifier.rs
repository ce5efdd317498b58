//! PositionNotifier - user-facing notifications for queue moves.
//!
//! Synchronous consumer of `waitlist.position_changed.v1`: ordering of
//! position notifications matters, so they are published inline, in the
//! order the reindex produced them. Delivery itself is best-effort; a
//! failed publish is logged and never fails the originating command.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::application::dispatcher::SyncEventHandler;
use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::domain::registration::WaitlistPositionChanged;
use crate::ports::{
    LiveEventReader, NotificationPublisher, RegistrationAction, RegistrationNotification,
    UserRepository,
};

/// Publishes per-event position-change notifications.
pub struct PositionNotifier {
    events: Arc<dyn LiveEventReader>,
    users: Arc<dyn UserRepository>,
    publisher: Arc<dyn NotificationPublisher>,
}

impl PositionNotifier {
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
}

#[async_trait]
impl SyncEventHandler for PositionNotifier {
    async fn handle(&self, envelope: &EventEnvelope) -> Result<Vec<EventEnvelope>, DomainError> {
        let event: WaitlistPositionChanged = envelope.payload_as().map_err(|e| {
            DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Undecodable position change payload: {}", e),
            )
        })?;

        let (live_event, user) = tokio::join!(
            self.events.get(&event.live_event_id),
            self.users.find_by_id(&event.user_id)
        );

        let Some(live_event) = live_event? else {
            warn!(event_id = %event.live_event_id, "position change for unknown event; skipping");
            return Ok(Vec::new());
        };
        let Some(user) = user? else {
            warn!(user_id = %event.user_id, "position change for unknown user; skipping");
            return Ok(Vec::new());
        };

        let notification = RegistrationNotification {
            event_id: event.live_event_id,
            event_title: live_event.name().to_string(),
            registration_id: event.registration_id,
            user_id: event.user_id,
            user_name: user.display_name(),
            action: RegistrationAction::PositionChanged,
            timestamp: event.occurred_at,
        };

        if let Err(e) = self.publisher.publish(notification).await {
            warn!(error = %e, "position notification publish failed");
        }
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "PositionNotifier"
    }
}

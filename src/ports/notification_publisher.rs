//! NotificationPublisher port - per-event fan-out to subscribers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, LiveEventId, RegistrationId, Timestamp, UserId};

/// What happened to a registration, from a subscriber's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationAction {
    Registered,
    Waitlisted,
    Promoted,
    PositionChanged,
}

impl std::fmt::Display for RegistrationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RegistrationAction::Registered => "registered",
            RegistrationAction::Waitlisted => "waitlisted",
            RegistrationAction::Promoted => "promoted",
            RegistrationAction::PositionChanged => "position_changed",
        };
        write!(f, "{}", s)
    }
}

/// Payload delivered on the per-event subscription topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationNotification {
    pub event_id: LiveEventId,
    pub event_title: String,
    pub registration_id: RegistrationId,
    pub user_id: UserId,
    pub user_name: String,
    pub action: RegistrationAction,
    pub timestamp: Timestamp,
}

impl RegistrationNotification {
    /// Topic subscribers address: one channel per event.
    pub fn topic(&self) -> String {
        topic_for(&self.event_id)
    }

    /// Dedup key: subscribers tolerate redelivery by ignoring repeats.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.registration_id,
            self.action,
            self.timestamp.as_unix_secs()
        )
    }
}

/// Topic name for an event's registration feed.
pub fn topic_for(event_id: &LiveEventId) -> String {
    format!("eventRegistration_{}", event_id)
}

/// Port for publishing subscriber notifications.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Publish one notification on its per-event topic.
    async fn publish(&self, notification: RegistrationNotification) -> Result<(), DomainError>;
}

//! In-memory transports for testing and single-node dev.
//!
//! Capture-based: tests assert on what was sent rather than standing up
//! redis. Production uses the redis adapters.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::{NotificationPublisher, QueueTransport, RegistrationNotification};

/// In-memory queue transport: records envelopes instead of shipping them.
#[derive(Default)]
pub struct InMemoryQueueTransport {
    sent: Mutex<Vec<EventEnvelope>>,
    dead: Mutex<Vec<EventEnvelope>>,
}

impl InMemoryQueueTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn sent_guard(&self) -> MutexGuard<'_, Vec<EventEnvelope>> {
        self.sent
            .lock()
            .expect("InMemoryQueueTransport: sent lock poisoned")
    }

    /// All envelopes pushed onto the queue (test assertions).
    pub fn sent(&self) -> Vec<EventEnvelope> {
        self.sent_guard().clone()
    }

    /// All envelopes dead-lettered (test assertions).
    pub fn dead_letters(&self) -> Vec<EventEnvelope> {
        self.dead
            .lock()
            .expect("InMemoryQueueTransport: dead lock poisoned")
            .clone()
    }
}

#[async_trait]
impl QueueTransport for InMemoryQueueTransport {
    async fn send(&self, envelope: &EventEnvelope) -> Result<(), DomainError> {
        self.sent_guard().push(envelope.clone());
        Ok(())
    }

    async fn send_dead_letter(&self, envelope: &EventEnvelope) -> Result<(), DomainError> {
        self.dead
            .lock()
            .expect("InMemoryQueueTransport: dead lock poisoned")
            .push(envelope.clone());
        Ok(())
    }
}

/// In-memory notification fan-out: records per-topic payloads.
#[derive(Default)]
pub struct InMemoryNotificationBus {
    published: Mutex<Vec<RegistrationNotification>>,
}

impl InMemoryNotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// All notifications published (test assertions).
    pub fn published(&self) -> Vec<RegistrationNotification> {
        self.published
            .lock()
            .expect("InMemoryNotificationBus: lock poisoned")
            .clone()
    }

    /// Notifications for one topic, in publish order.
    pub fn for_topic(&self, topic: &str) -> Vec<RegistrationNotification> {
        self.published()
            .into_iter()
            .filter(|n| n.topic() == topic)
            .collect()
    }
}

#[async_trait]
impl NotificationPublisher for InMemoryNotificationBus {
    async fn publish(&self, notification: RegistrationNotification) -> Result<(), DomainError> {
        self.published
            .lock()
            .expect("InMemoryNotificationBus: lock poisoned")
            .push(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{LiveEventId, RegistrationId, Timestamp, UserId};
    use crate::ports::{topic_for, RegistrationAction};

    #[tokio::test]
    async fn transport_captures_sent_and_dead() {
        let transport = InMemoryQueueTransport::new();
        let envelope = EventEnvelope::test_fixture();

        transport.send(&envelope).await.unwrap();
        transport.send_dead_letter(&envelope).await.unwrap();

        assert_eq!(transport.sent().len(), 1);
        assert_eq!(transport.dead_letters().len(), 1);
    }

    #[tokio::test]
    async fn notification_bus_filters_by_topic() {
        let bus = InMemoryNotificationBus::new();
        let event_a = LiveEventId::new();
        let event_b = LiveEventId::new();

        for event_id in [event_a, event_b, event_a] {
            bus.publish(RegistrationNotification {
                event_id,
                event_title: "T".to_string(),
                registration_id: RegistrationId::new(),
                user_id: UserId::new(),
                user_name: "Ada".to_string(),
                action: RegistrationAction::Registered,
                timestamp: Timestamp::now(),
            })
            .await
            .unwrap();
        }

        assert_eq!(bus.for_topic(&topic_for(&event_a)).len(), 2);
        assert_eq!(bus.for_topic(&topic_for(&event_b)).len(), 1);
    }
}

//! Redis-backed queue transport and notification publisher.
//!
//! The queue is a redis list (`LPUSH`; consumers `BRPOP`), carrying the
//! `{ event_type, payload }` envelope JSON; the dead-letter queue is a
//! second list. Notifications go out over pub/sub, one channel per event.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::{NotificationPublisher, QueueTransport, RegistrationNotification};

/// Redis list transport for outbox payloads.
#[derive(Clone)]
pub struct RedisQueueTransport {
    conn: MultiplexedConnection,
    queue_name: String,
    dead_letter_name: String,
}

impl RedisQueueTransport {
    pub fn new(
        conn: MultiplexedConnection,
        queue_name: impl Into<String>,
        dead_letter_name: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            queue_name: queue_name.into(),
            dead_letter_name: dead_letter_name.into(),
        }
    }

    async fn push(&self, list: &str, envelope: &EventEnvelope) -> Result<(), DomainError> {
        let payload = serde_json::to_string(envelope).map_err(|e| {
            DomainError::new(
                ErrorCode::QueueError,
                format!("Failed to serialize envelope: {}", e),
            )
        })?;

        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(list, payload)
            .await
            .map_err(|e: redis::RedisError| {
                DomainError::new(ErrorCode::QueueError, format!("Queue push failed: {}", e))
            })
    }
}

#[async_trait]
impl QueueTransport for RedisQueueTransport {
    async fn send(&self, envelope: &EventEnvelope) -> Result<(), DomainError> {
        self.push(&self.queue_name, envelope).await
    }

    async fn send_dead_letter(&self, envelope: &EventEnvelope) -> Result<(), DomainError> {
        self.push(&self.dead_letter_name, envelope).await
    }
}

/// Redis pub/sub fan-out for registration notifications.
#[derive(Clone)]
pub struct RedisNotificationPublisher {
    conn: MultiplexedConnection,
}

impl RedisNotificationPublisher {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl NotificationPublisher for RedisNotificationPublisher {
    async fn publish(&self, notification: RegistrationNotification) -> Result<(), DomainError> {
        let topic = notification.topic();
        let payload = serde_json::to_string(&notification).map_err(|e| {
            DomainError::new(
                ErrorCode::QueueError,
                format!("Failed to serialize notification: {}", e),
            )
        })?;

        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(topic, payload)
            .await
            .map_err(|e: redis::RedisError| {
                DomainError::new(
                    ErrorCode::QueueError,
                    format!("Notification publish failed: {}", e),
                )
            })
    }
}

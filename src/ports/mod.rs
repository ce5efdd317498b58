//! Ports - Interfaces between the core and the outside world.
//!
//! Following hexagonal architecture, ports define the contracts the domain
//! and application layers depend on; adapters implement them.
//!
//! ## Store ports
//!
//! - `LiveEventRepository` / `LiveEventReader` - event write/read paths
//! - `UserRepository` - user persistence (PII handled by the adapter)
//! - `RegistrationStore` - transactional registration writes under the
//!   per-event advisory lock
//! - `RegistrationReader` - registration/waitlist queries
//! - `OutboxStore` - durable domain-event queue
//!
//! ## Delivery ports
//!
//! - `EventHandler` / `EventSubscriber` - consumers and their routing
//! - `QueueTransport` - external queue between outbox and consumers
//! - `ProcessedEventStore` - per-handler dedup for at-least-once delivery
//! - `NotificationPublisher` - per-event subscriber fan-out
//!
//! ## Cross-cutting ports
//!
//! - `IdempotencyStore` - duplicate-command claims
//! - `CacheStore` - read-through cache
//! - `PiiCipher` - field encryption at rest

mod cache_store;
mod event_handler;
mod idempotency_store;
mod live_event_reader;
mod live_event_repository;
mod notification_publisher;
mod outbox_store;
mod pii_cipher;
mod processed_event_store;
mod queue_transport;
mod registration_reader;
mod registration_store;
mod user_repository;

pub use cache_store::{event_key, user_key, CacheStore, EVENT_LIST_PREFIX};
pub use event_handler::{EventHandler, EventSubscriber};
pub use idempotency_store::IdempotencyStore;
pub use live_event_reader::{LiveEventFilter, LiveEventPage, LiveEventReader, Page};
pub use live_event_repository::LiveEventRepository;
pub use notification_publisher::{
    topic_for, NotificationPublisher, RegistrationAction, RegistrationNotification,
};
pub use outbox_store::{OutboxMessage, OutboxStatus, OutboxStore};
pub use pii_cipher::PiiCipher;
pub use processed_event_store::ProcessedEventStore;
pub use queue_transport::QueueTransport;
pub use registration_reader::{RegistrationPage, RegistrationReader, WaitlistRow};
pub use registration_store::{
    AdmissionOutcome, CancellationOutcome, EmittedEvents, PromotionOutcome, RegistrationStore,
};
pub use user_repository::UserRepository;

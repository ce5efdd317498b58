//! Event delivery adapters: routing, transports, the queue worker, and the
//! idempotency decorator.

mod idempotent_handler;
mod in_memory;
mod queue_worker;
mod redis_queue;
mod registry;

pub use idempotent_handler::IdempotentHandler;
pub use in_memory::{InMemoryNotificationBus, InMemoryQueueTransport};
pub use queue_worker::{QueueWorker, QueueWorkerConfig};
pub use redis_queue::{RedisNotificationPublisher, RedisQueueTransport};
pub use registry::{is_fatal, EventRouter};

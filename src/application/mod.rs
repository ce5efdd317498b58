//! Application layer: the event dispatcher, command/query handlers, and
//! the thin metrics glue.

pub mod dispatcher;
pub mod handlers;
pub mod metrics;

pub use dispatcher::{is_synchronous, EventDispatcher, SyncEventHandler};
pub use metrics::{Metrics, MetricsSnapshot};

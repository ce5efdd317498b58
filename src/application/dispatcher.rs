//! EventDispatcher - routes domain events to their delivery pipeline.
//!
//! Two pipelines exist:
//!
//! - **Synchronous**: ordering-sensitive events
//!   (`registration.cancelled.v1`, `event.capacity_increased.v1`,
//!   `waitlist.removed.v1`, `waitlist.position_changed.v1`) are handled
//!   in-process, after the originating transaction commits and before the
//!   command returns. Promotion and reindexing live here so a reader never
//!   observes a half-updated waitlist.
//! - **Asynchronous**: everything else was already written to the outbox by
//!   the store transaction; the queue worker delivers it with retries.
//!
//! Routing is data-driven: an explicit table of event type → handler set,
//! registered at composition time. Sync handlers may return follow-up sync
//! events (promotion produces position changes); the dispatcher drains the
//! resulting worklist with a depth guard.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::EmittedEvents;

/// Event types that must complete in-process before the command returns.
pub const SYNCHRONOUS_EVENT_TYPES: &[&str] = &[
    "registration.cancelled.v1",
    "event.capacity_increased.v1",
    "waitlist.removed.v1",
    "waitlist.position_changed.v1",
];

/// Whether an event type belongs to the synchronous pipeline.
pub fn is_synchronous(event_type: &str) -> bool {
    SYNCHRONOUS_EVENT_TYPES.contains(&event_type)
}

/// Bound on cascading sync dispatch rounds. A cancel triggers promotion,
/// promotion triggers position notifications, and that is the deepest chain
/// the domain produces; hitting the bound means a handler loop.
const MAX_DISPATCH_DEPTH: usize = 16;

/// An in-process consumer of synchronous events.
///
/// Unlike the async `EventHandler`, a sync handler may emit follow-up
/// synchronous events (its outbox-bound events are persisted by the store
/// transaction it runs).
#[async_trait]
pub trait SyncEventHandler: Send + Sync {
    /// Process one envelope; returns follow-up synchronous envelopes.
    async fn handle(&self, envelope: &EventEnvelope) -> Result<Vec<EventEnvelope>, DomainError>;

    /// Stable handler name for logs.
    fn name(&self) -> &'static str;
}

/// Routes domain events produced by store transactions.
pub struct EventDispatcher {
    sync_routes: RwLock<HashMap<String, Vec<Arc<dyn SyncEventHandler>>>>,
}

impl EventDispatcher {
    /// Creates a dispatcher with no routes; handlers are registered at
    /// composition time.
    pub fn new() -> Self {
        Self {
            sync_routes: RwLock::new(HashMap::new()),
        }
    }

    /// Register a sync handler for one event type.
    pub fn on_sync(&self, event_type: &str, handler: Arc<dyn SyncEventHandler>) {
        debug_assert!(
            is_synchronous(event_type),
            "{} is not a synchronous event type",
            event_type
        );
        self.sync_routes
            .write()
            .expect("EventDispatcher: routes lock poisoned")
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
    }

    /// Dispatch the outcome of a store transaction.
    ///
    /// Queued envelopes are already durable in the outbox, so only the
    /// synchronous ones need work here. Handler failures propagate to the
    /// caller: a failed promotion must fail the originating command.
    pub async fn dispatch(&self, events: EmittedEvents) -> Result<(), DomainError> {
        self.dispatch_sync(events.synchronous).await
    }

    /// Drain a worklist of synchronous envelopes through the route table.
    pub async fn dispatch_sync(
        &self,
        envelopes: Vec<EventEnvelope>,
    ) -> Result<(), DomainError> {
        let mut worklist: VecDeque<(EventEnvelope, usize)> =
            envelopes.into_iter().map(|e| (e, 0)).collect();

        while let Some((envelope, depth)) = worklist.pop_front() {
            if depth >= MAX_DISPATCH_DEPTH {
                return Err(DomainError::new(
                    ErrorCode::InternalError,
                    format!(
                        "Synchronous dispatch exceeded depth {} at {}",
                        MAX_DISPATCH_DEPTH, envelope.event_type
                    ),
                ));
            }

            let handlers: Vec<Arc<dyn SyncEventHandler>> = {
                let routes = self
                    .sync_routes
                    .read()
                    .expect("EventDispatcher: routes lock poisoned");
                routes.get(&envelope.event_type).cloned().unwrap_or_default()
            };

            for handler in handlers {
                debug!(
                    event_type = %envelope.event_type,
                    handler = handler.name(),
                    "dispatching synchronous event"
                );
                let follow_ups = handler.handle(&envelope).await?;
                worklist.extend(follow_ups.into_iter().map(|e| (e, depth + 1)));
            }
        }

        Ok(())
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

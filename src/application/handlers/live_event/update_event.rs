//! UpdateEventHandler - mutates event attributes; capacity growth triggers
//! the synchronous promotion pass.

use std::sync::Arc;

use crate::application::EventDispatcher;
use crate::domain::foundation::{
    CommandMetadata, DomainError, ErrorCode, EventId, EventMetadata, LiveEventId,
    SerializableDomainEvent, Timestamp,
};
use crate::domain::live_event::{CapacityChange, EventCapacityIncreased, EventLimits, EventPatch, LiveEvent};
use crate::ports::{
    event_key, CacheStore, LiveEventRepository, RegistrationReader, EVENT_LIST_PREFIX,
};

/// Command to update an event's mutable attributes.
#[derive(Debug, Clone)]
pub struct UpdateEventCommand {
    pub live_event_id: LiveEventId,
    pub patch: EventPatch,
}

/// Result of an update.
#[derive(Debug, Clone)]
pub struct UpdateEventResult {
    pub event: LiveEvent,
    /// Set when capacity now sits below the confirmed count. Nobody is
    /// cancelled; adapters decide whether to surface a warning.
    pub capacity_below_confirmed: bool,
}

/// Handler for event updates.
pub struct UpdateEventHandler {
    events: Arc<dyn LiveEventRepository>,
    registrations: Arc<dyn RegistrationReader>,
    dispatcher: Arc<EventDispatcher>,
    cache: Arc<dyn CacheStore>,
    limits: EventLimits,
}

impl UpdateEventHandler {
    pub fn new(
        events: Arc<dyn LiveEventRepository>,
        registrations: Arc<dyn RegistrationReader>,
        dispatcher: Arc<EventDispatcher>,
        cache: Arc<dyn CacheStore>,
        limits: EventLimits,
    ) -> Self {
        Self {
            events,
            registrations,
            dispatcher,
            cache,
            limits,
        }
    }

    pub async fn handle(
        &self,
        cmd: UpdateEventCommand,
        metadata: CommandMetadata,
    ) -> Result<UpdateEventResult, DomainError> {
        if !metadata.requester.is_admin {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "Only admins may update events",
            ));
        }

        // 1. Load and patch the aggregate.
        let mut event = self
            .events
            .find_by_id(&cmd.live_event_id)
            .await?
            .ok_or_else(|| DomainError::event_not_found(cmd.live_event_id))?;
        let change = event.update(cmd.patch, &self.limits)?;

        // 2. Persist and invalidate cached reads.
        self.events.update(&event).await?;
        self.cache.invalidate(&event_key(event.id())).await?;
        self.cache.invalidate_prefix(EVENT_LIST_PREFIX).await?;

        // 3. Capacity growth promotes waitlisted rows before returning.
        if let CapacityChange::Increased { additional } = change {
            let envelope = EventCapacityIncreased {
                event_id: EventId::new(),
                live_event_id: *event.id(),
                additional,
                new_capacity: event.capacity(),
                occurred_at: Timestamp::now(),
            }
            .to_envelope()
            .with_metadata(EventMetadata {
                correlation_id: Some(metadata.correlation_id()),
                causation_id: None,
                user_id: Some(metadata.requester.subject.clone()),
            });
            self.dispatcher.dispatch_sync(vec![envelope]).await?;
        }

        // 4. Shrinking below the confirmed count is legal but worth flagging.
        let capacity_below_confirmed = matches!(change, CapacityChange::Decreased)
            && self.registrations.confirmed_count(event.id()).await? > event.capacity() as i64;
        if capacity_below_confirmed {
            tracing::warn!(
                event_id = %event.id(),
                capacity = event.capacity(),
                "capacity reduced below confirmed count; surplus rows retained"
            );
        }

        Ok(UpdateEventResult {
            event,
            capacity_below_confirmed,
        })
    }
}

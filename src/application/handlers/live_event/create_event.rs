//! CreateEventHandler - admin command creating a new (unpublished) event.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, DomainError, ErrorCode, LiveEventId, Timestamp};
use crate::domain::live_event::{EventLimits, LiveEvent};
use crate::ports::{CacheStore, LiveEventRepository, EVENT_LIST_PREFIX};

/// Command to create an event.
#[derive(Debug, Clone)]
pub struct CreateEventCommand {
    pub name: String,
    pub description: String,
    pub start_utc: Timestamp,
    pub end_utc: Timestamp,
    pub timezone: String,
    pub location: String,
    pub capacity: i32,
}

/// Handler for event creation.
pub struct CreateEventHandler {
    events: Arc<dyn LiveEventRepository>,
    cache: Arc<dyn CacheStore>,
    limits: EventLimits,
}

impl CreateEventHandler {
    pub fn new(
        events: Arc<dyn LiveEventRepository>,
        cache: Arc<dyn CacheStore>,
        limits: EventLimits,
    ) -> Self {
        Self {
            events,
            cache,
            limits,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateEventCommand,
        metadata: CommandMetadata,
    ) -> Result<LiveEvent, DomainError> {
        if !metadata.requester.is_admin {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "Only admins may create events",
            ));
        }

        let event = LiveEvent::new(
            LiveEventId::new(),
            cmd.name,
            cmd.description,
            cmd.start_utc,
            cmd.end_utc,
            cmd.timezone,
            cmd.location,
            cmd.capacity,
            metadata.requester.subject.clone(),
            &self.limits,
        )?;

        self.events.save(&event).await?;
        self.cache.invalidate_prefix(EVENT_LIST_PREFIX).await?;

        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::InMemoryCacheStore;
    use crate::adapters::memory::InMemoryStore;

    fn command() -> CreateEventCommand {
        let start = Timestamp::now().plus_hours(24);
        CreateEventCommand {
            name: "Launch Party".to_string(),
            description: String::new(),
            start_utc: start,
            end_utc: start.plus_hours(3),
            timezone: "UTC".to_string(),
            location: "Rooftop".to_string(),
            capacity: 50,
        }
    }

    fn handler(store: &Arc<InMemoryStore>) -> CreateEventHandler {
        CreateEventHandler::new(
            store.clone(),
            Arc::new(InMemoryCacheStore::new()),
            EventLimits::default(),
        )
    }

    #[tokio::test]
    async fn admin_creates_unpublished_event() {
        let store = Arc::new(InMemoryStore::new());
        let event = handler(&store)
            .handle(command(), CommandMetadata::test_admin())
            .await
            .unwrap();

        assert!(!event.is_published());
        assert_eq!(event.organizer_id(), "admin-123");
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let store = Arc::new(InMemoryStore::new());
        let err = handler(&store)
            .handle(command(), CommandMetadata::test_user())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn oversized_capacity_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let mut cmd = command();
        cmd.capacity = 10_001;
        let err = handler(&store)
            .handle(cmd, CommandMetadata::test_admin())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::domain::foundation::ErrorKind::Validation);
    }
}

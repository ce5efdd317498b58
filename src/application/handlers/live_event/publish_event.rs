//! PublishEventHandler - visibility toggles. Idempotent.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, DomainError, ErrorCode, LiveEventId};
use crate::domain::live_event::LiveEvent;
use crate::ports::{event_key, CacheStore, LiveEventRepository, EVENT_LIST_PREFIX};

/// Command toggling event visibility.
#[derive(Debug, Clone)]
pub struct PublishEventCommand {
    pub live_event_id: LiveEventId,
    /// true = publish, false = unpublish.
    pub publish: bool,
}

/// Result of a publish toggle.
#[derive(Debug, Clone)]
pub struct PublishEventResult {
    pub event: LiveEvent,
    /// False when the event was already in the requested state.
    pub changed: bool,
}

/// Handler for publish/unpublish.
pub struct PublishEventHandler {
    events: Arc<dyn LiveEventRepository>,
    cache: Arc<dyn CacheStore>,
}

impl PublishEventHandler {
    pub fn new(events: Arc<dyn LiveEventRepository>, cache: Arc<dyn CacheStore>) -> Self {
        Self { events, cache }
    }

    pub async fn handle(
        &self,
        cmd: PublishEventCommand,
        metadata: CommandMetadata,
    ) -> Result<PublishEventResult, DomainError> {
        if !metadata.requester.is_admin {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "Only admins may publish events",
            ));
        }

        let mut event = self
            .events
            .find_by_id(&cmd.live_event_id)
            .await?
            .ok_or_else(|| DomainError::event_not_found(cmd.live_event_id))?;

        let changed = if cmd.publish {
            event.publish()
        } else {
            event.unpublish()
        };

        if changed {
            self.events.update(&event).await?;
            self.cache.invalidate(&event_key(event.id())).await?;
            self.cache.invalidate_prefix(EVENT_LIST_PREFIX).await?;
        }

        Ok(PublishEventResult { event, changed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::InMemoryCacheStore;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::Timestamp;
    use crate::domain::live_event::EventLimits;
    use crate::ports::LiveEventRepository as _;

    async fn seeded() -> (Arc<InMemoryStore>, LiveEvent) {
        let store = Arc::new(InMemoryStore::new());
        let start = Timestamp::now().plus_hours(24);
        let event = LiveEvent::new(
            LiveEventId::new(),
            "Meetup".to_string(),
            String::new(),
            start,
            start.plus_hours(1),
            "UTC".to_string(),
            String::new(),
            10,
            "org-1".to_string(),
            &EventLimits::default(),
        )
        .unwrap();
        store.save(&event).await.unwrap();
        (store, event)
    }

    #[tokio::test]
    async fn publish_twice_is_idempotent() {
        let (store, event) = seeded().await;
        let handler =
            PublishEventHandler::new(store.clone(), Arc::new(InMemoryCacheStore::new()));

        let cmd = PublishEventCommand {
            live_event_id: *event.id(),
            publish: true,
        };
        let first = handler
            .handle(cmd.clone(), CommandMetadata::test_admin())
            .await
            .unwrap();
        let second = handler
            .handle(cmd, CommandMetadata::test_admin())
            .await
            .unwrap();

        assert!(first.changed);
        assert!(!second.changed);
        assert!(second.event.is_published());
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let (store, event) = seeded().await;
        let handler =
            PublishEventHandler::new(store.clone(), Arc::new(InMemoryCacheStore::new()));
        let err = handler
            .handle(
                PublishEventCommand {
                    live_event_id: *event.id(),
                    publish: true,
                },
                CommandMetadata::test_user(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }
}

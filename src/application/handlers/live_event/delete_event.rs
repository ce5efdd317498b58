//! DeleteEventHandler - removes an event that has no registrations.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, DomainError, ErrorCode, LiveEventId};
use crate::ports::{
    event_key, CacheStore, LiveEventRepository, RegistrationReader, EVENT_LIST_PREFIX,
};

/// Command to delete an event.
#[derive(Debug, Clone)]
pub struct DeleteEventCommand {
    pub live_event_id: LiveEventId,
}

/// Handler for event deletion.
pub struct DeleteEventHandler {
    events: Arc<dyn LiveEventRepository>,
    registrations: Arc<dyn RegistrationReader>,
    cache: Arc<dyn CacheStore>,
}

impl DeleteEventHandler {
    pub fn new(
        events: Arc<dyn LiveEventRepository>,
        registrations: Arc<dyn RegistrationReader>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            events,
            registrations,
            cache,
        }
    }

    pub async fn handle(
        &self,
        cmd: DeleteEventCommand,
        metadata: CommandMetadata,
    ) -> Result<(), DomainError> {
        if !metadata.requester.is_admin {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "Only admins may delete events",
            ));
        }

        // The repository re-checks inside its own statement; this early
        // check exists for the friendlier error.
        let count = self
            .registrations
            .count_for_event(&cmd.live_event_id)
            .await?;
        if count > 0 {
            return Err(DomainError::new(
                ErrorCode::EventHasRegistrations,
                format!(
                    "Event {} has {} registrations and cannot be deleted",
                    cmd.live_event_id, count
                ),
            ));
        }

        self.events.delete(&cmd.live_event_id).await?;
        self.cache.invalidate(&event_key(cmd.live_event_id)).await?;
        self.cache.invalidate_prefix(EVENT_LIST_PREFIX).await?;
        Ok(())
    }
}

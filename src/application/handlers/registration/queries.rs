//! Admin query handlers for registrations and the waitlist.

use std::sync::Arc;

use crate::domain::foundation::{CommandMetadata, DomainError, ErrorCode, LiveEventId};
use crate::domain::registration::RegistrationStatus;
use crate::ports::{Page, RegistrationPage, RegistrationReader, WaitlistRow};

fn require_admin(metadata: &CommandMetadata) -> Result<(), DomainError> {
    if metadata.requester.is_admin {
        Ok(())
    } else {
        Err(DomainError::new(
            ErrorCode::Forbidden,
            "Admin role required",
        ))
    }
}

/// Query for an event's registrations.
#[derive(Debug, Clone)]
pub struct ListRegistrationsQuery {
    pub live_event_id: LiveEventId,
    pub status: Option<RegistrationStatus>,
    pub page: Page,
}

/// Handler listing an event's registrations (admin).
pub struct ListRegistrationsHandler {
    reader: Arc<dyn RegistrationReader>,
}

impl ListRegistrationsHandler {
    pub fn new(reader: Arc<dyn RegistrationReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(
        &self,
        query: ListRegistrationsQuery,
        metadata: CommandMetadata,
    ) -> Result<RegistrationPage, DomainError> {
        require_admin(&metadata)?;
        self.reader
            .list_for_event(&query.live_event_id, query.status, query.page)
            .await
    }
}

/// Query for an event's waitlist, in position order.
#[derive(Debug, Clone)]
pub struct GetWaitlistQuery {
    pub live_event_id: LiveEventId,
}

/// Handler returning the waitlist with positions (admin).
pub struct GetWaitlistHandler {
    reader: Arc<dyn RegistrationReader>,
}

impl GetWaitlistHandler {
    pub fn new(reader: Arc<dyn RegistrationReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(
        &self,
        query: GetWaitlistQuery,
        metadata: CommandMetadata,
    ) -> Result<Vec<WaitlistRow>, DomainError> {
        require_admin(&metadata)?;
        self.reader.waitlist_for_event(&query.live_event_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::foundation::{Timestamp, UserId};
    use crate::domain::live_event::{EventLimits, LiveEvent};
    use crate::ports::{LiveEventRepository as _, RegistrationStore as _};

    async fn seeded() -> (Arc<InMemoryStore>, LiveEvent) {
        let store = Arc::new(InMemoryStore::new());
        let start = Timestamp::now().plus_hours(24);
        let mut event = LiveEvent::new(
            crate::domain::foundation::LiveEventId::new(),
            "Talk".to_string(),
            String::new(),
            start,
            start.plus_hours(1),
            "UTC".to_string(),
            String::new(),
            1,
            "org-1".to_string(),
            &EventLimits::default(),
        )
        .unwrap();
        event.publish();
        store.save(&event).await.unwrap();

        for _ in 0..3 {
            store
                .admit(&event, UserId::new(), None, Default::default())
                .await
                .unwrap();
        }
        (store, event)
    }

    #[tokio::test]
    async fn waitlist_query_requires_admin() {
        let (store, event) = seeded().await;
        let handler = GetWaitlistHandler::new(store.clone());

        let err = handler
            .handle(
                GetWaitlistQuery {
                    live_event_id: *event.id(),
                },
                CommandMetadata::test_user(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let rows = handler
            .handle(
                GetWaitlistQuery {
                    live_event_id: *event.id(),
                },
                CommandMetadata::test_admin(),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].position, 1);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let (store, event) = seeded().await;
        let handler = ListRegistrationsHandler::new(store.clone());

        let page = handler
            .handle(
                ListRegistrationsQuery {
                    live_event_id: *event.id(),
                    status: Some(RegistrationStatus::Waitlisted),
                    page: Page::default(),
                },
                CommandMetadata::test_admin(),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }
}

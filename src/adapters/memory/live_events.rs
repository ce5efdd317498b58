//! In-memory LiveEventRepository and LiveEventReader.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, LiveEventId, Timestamp};
use crate::domain::live_event::LiveEvent;
use crate::ports::{LiveEventFilter, LiveEventPage, LiveEventReader, LiveEventRepository, Page};

use super::state::InMemoryStore;

#[async_trait]
impl LiveEventRepository for InMemoryStore {
    async fn save(&self, event: &LiveEvent) -> Result<(), DomainError> {
        self.inner
            .lock()
            .await
            .events
            .insert(*event.id(), event.clone());
        Ok(())
    }

    async fn update(&self, event: &LiveEvent) -> Result<(), DomainError> {
        let mut state = self.inner.lock().await;
        if !state.events.contains_key(event.id()) {
            return Err(DomainError::event_not_found(event.id()));
        }
        state.events.insert(*event.id(), event.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &LiveEventId) -> Result<Option<LiveEvent>, DomainError> {
        Ok(self.inner.lock().await.events.get(id).cloned())
    }

    async fn delete(&self, id: &LiveEventId) -> Result<(), DomainError> {
        let mut state = self.inner.lock().await;
        let has_registrations = state
            .registrations
            .values()
            .any(|r| r.live_event_id() == id);
        if has_registrations {
            return Err(DomainError::new(
                ErrorCode::EventHasRegistrations,
                format!("Event {} has registrations and cannot be deleted", id),
            ));
        }
        if state.events.remove(id).is_none() {
            return Err(DomainError::event_not_found(id));
        }
        Ok(())
    }
}

#[async_trait]
impl LiveEventReader for InMemoryStore {
    async fn get(&self, id: &LiveEventId) -> Result<Option<LiveEvent>, DomainError> {
        Ok(self.inner.lock().await.events.get(id).cloned())
    }

    async fn list(
        &self,
        filter: &LiveEventFilter,
        page: Page,
    ) -> Result<LiveEventPage, DomainError> {
        let state = self.inner.lock().await;
        let now = Timestamp::now();

        let mut items: Vec<LiveEvent> = state
            .events
            .values()
            .filter(|e| !filter.published_only || e.is_published())
            .filter(|e| !filter.upcoming_only || e.start_utc().is_after(&now))
            .filter(|e| {
                filter
                    .organizer_id
                    .as_deref()
                    .map_or(true, |org| e.organizer_id() == org)
            })
            .cloned()
            .collect();
        items.sort_by(|a, b| a.start_utc().cmp(b.start_utc()));

        let total = items.len() as i64;
        let items = items
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();

        Ok(LiveEventPage { items, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::live_event::EventLimits;

    fn event(name: &str, published: bool, hours_from_now: i64) -> LiveEvent {
        let start = Timestamp::now().plus_hours(hours_from_now);
        let mut e = LiveEvent::new(
            LiveEventId::new(),
            name.to_string(),
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
        if published {
            e.publish();
        }
        e
    }

    #[tokio::test]
    async fn list_filters_published_and_upcoming() {
        let store = InMemoryStore::new();
        store.save(&event("published", true, 24)).await.unwrap();
        store.save(&event("draft", false, 24)).await.unwrap();

        let filter = LiveEventFilter {
            published_only: true,
            upcoming_only: true,
            organizer_id: None,
        };
        let page = store.list(&filter, Page::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name(), "published");
    }

    #[tokio::test]
    async fn list_orders_by_start_time() {
        let store = InMemoryStore::new();
        store.save(&event("later", true, 48)).await.unwrap();
        store.save(&event("sooner", true, 24)).await.unwrap();

        let page = store
            .list(&LiveEventFilter::default(), Page::default())
            .await
            .unwrap();
        assert_eq!(page.items[0].name(), "sooner");
    }

    #[tokio::test]
    async fn delete_fails_when_missing() {
        let store = InMemoryStore::new();
        let err = store.delete(&LiveEventId::new()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::EventNotFound);
    }
}

//! Read-through query handlers for events.
//!
//! Cache keys: `event:<id>` and the list-page keys under `events:list:`.
//! A cold cache always falls through to the reader, so answers never differ
//! between cold and warm caches.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::application::Metrics;
use crate::domain::foundation::{DomainError, LiveEventId};
use crate::domain::live_event::LiveEvent;
use crate::ports::{
    event_key, CacheStore, LiveEventFilter, LiveEventPage, LiveEventReader, Page,
};

/// Query for one event.
#[derive(Debug, Clone)]
pub struct GetEventQuery {
    pub live_event_id: LiveEventId,
}

/// Handler serving single-event reads through the cache.
pub struct GetEventHandler {
    reader: Arc<dyn LiveEventReader>,
    cache: Arc<dyn CacheStore>,
    metrics: Arc<Metrics>,
    ttl: Duration,
}

impl GetEventHandler {
    pub fn new(
        reader: Arc<dyn LiveEventReader>,
        cache: Arc<dyn CacheStore>,
        metrics: Arc<Metrics>,
        ttl: Duration,
    ) -> Self {
        Self {
            reader,
            cache,
            metrics,
            ttl,
        }
    }

    pub async fn handle(&self, query: GetEventQuery) -> Result<Option<LiveEvent>, DomainError> {
        let key = event_key(query.live_event_id);

        if let Some(cached) = self.cache.get(&key).await? {
            if let Ok(event) = serde_json::from_str::<LiveEvent>(&cached) {
                self.metrics.incr_cache_hit();
                return Ok(Some(event));
            }
            // Unreadable cache entry: treat as a miss and repair below.
            debug!(key = %key, "dropping undecodable cache entry");
            self.cache.invalidate(&key).await?;
        }

        self.metrics.incr_cache_miss();
        let event = self.reader.get(&query.live_event_id).await?;
        if let Some(event) = &event {
            if let Ok(json) = serde_json::to_string(event) {
                self.cache.set(&key, &json, self.ttl).await?;
            }
        }
        Ok(event)
    }
}

/// Query for an event listing.
#[derive(Debug, Clone)]
pub struct ListEventsQuery {
    pub filter: LiveEventFilter,
    pub page: Page,
}

/// Handler serving paginated listings through the cache.
pub struct ListEventsHandler {
    reader: Arc<dyn LiveEventReader>,
    cache: Arc<dyn CacheStore>,
    metrics: Arc<Metrics>,
    ttl: Duration,
}

impl ListEventsHandler {
    pub fn new(
        reader: Arc<dyn LiveEventReader>,
        cache: Arc<dyn CacheStore>,
        metrics: Arc<Metrics>,
        ttl: Duration,
    ) -> Self {
        Self {
            reader,
            cache,
            metrics,
            ttl,
        }
    }

    pub async fn handle(&self, query: ListEventsQuery) -> Result<LiveEventPage, DomainError> {
        let key = query.filter.cache_key(&query.page);

        if let Some(cached) = self.cache.get(&key).await? {
            if let Ok(page) = serde_json::from_str::<LiveEventPage>(&cached) {
                self.metrics.incr_cache_hit();
                return Ok(page);
            }
            self.cache.invalidate(&key).await?;
        }

        self.metrics.incr_cache_miss();
        let page = self.reader.list(&query.filter, query.page).await?;
        if let Ok(json) = serde_json::to_string(&page) {
            self.cache.set(&key, &json, self.ttl).await?;
        }
        Ok(page)
    }
}

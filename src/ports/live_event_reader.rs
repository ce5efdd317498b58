//! LiveEventReader port - read-only event queries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, LiveEventId};
use crate::domain::live_event::LiveEvent;

/// Pagination window. Materialized to SQL `LIMIT/OFFSET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

impl Page {
    /// Builds a page from 1-based page number + size, clamping size to 100.
    pub fn from_number(page: u32, per_page: u32) -> Self {
        let limit = per_page.clamp(1, 100);
        let offset = page.saturating_sub(1).saturating_mul(limit);
        Self { offset, limit }
    }
}

/// Filter for event listings. Materialized to SQL `WHERE/ORDER BY`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveEventFilter {
    /// Only events visible to anonymous callers.
    pub published_only: bool,
    /// Only events whose start is in the future.
    pub upcoming_only: bool,
    /// Restrict to one organizer's events.
    pub organizer_id: Option<String>,
}

impl LiveEventFilter {
    /// Stable cache-key fragment for list-page caching.
    pub fn cache_key(&self, page: &Page) -> String {
        format!(
            "events:list:p{}:u{}:o{}:{}:{}",
            self.published_only as u8,
            self.upcoming_only as u8,
            self.organizer_id.as_deref().unwrap_or("-"),
            page.offset,
            page.limit
        )
    }
}

/// A page of events plus the unpaginated total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveEventPage {
    pub items: Vec<LiveEvent>,
    pub total: i64,
}

/// Port for read-only event queries.
#[async_trait]
pub trait LiveEventReader: Send + Sync {
    /// Load one event (read path; may be served from cache by the caller).
    async fn get(&self, id: &LiveEventId) -> Result<Option<LiveEvent>, DomainError>;

    /// List events matching the filter, ordered by start time ascending.
    async fn list(&self, filter: &LiveEventFilter, page: Page)
        -> Result<LiveEventPage, DomainError>;
}

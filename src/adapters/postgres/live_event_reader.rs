//! PostgreSQL implementation of LiveEventReader.
//!
//! Query-only: the filter object is materialized to `WHERE`/`ORDER BY`/
//! `LIMIT`/`OFFSET` here, and no row ever flows back into a write path.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, LiveEventId};
use crate::domain::live_event::LiveEvent;
use crate::ports::{LiveEventFilter, LiveEventPage, LiveEventReader, Page};

use super::live_event_repository::row_to_live_event;

fn db(context: &str) -> impl Fn(sqlx::Error) -> DomainError + '_ {
    move |e| DomainError::database(context, e)
}

/// PostgreSQL live-event reader.
#[derive(Clone)]
pub struct PostgresLiveEventReader {
    pool: PgPool,
}

impl PostgresLiveEventReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LiveEventReader for PostgresLiveEventReader {
    async fn get(&self, id: &LiveEventId) -> Result<Option<LiveEvent>, DomainError> {
        let row = sqlx::query(
            "SELECT id, name, description, start_date, end_date, timezone, location, \
                    capacity, organizer_id, is_published, is_waitlist_open, created_at, updated_at \
             FROM events WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db("Failed to fetch event"))?;

        row.map(row_to_live_event).transpose()
    }

    async fn list(
        &self,
        filter: &LiveEventFilter,
        page: Page,
    ) -> Result<LiveEventPage, DomainError> {
        let where_clause = "($1 = FALSE OR is_published = TRUE) \
             AND ($2 = FALSE OR start_date > NOW()) \
             AND ($3::text IS NULL OR organizer_id = $3)";

        let (total,): (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM events WHERE {}",
            where_clause
        ))
        .bind(filter.published_only)
        .bind(filter.upcoming_only)
        .bind(filter.organizer_id.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(db("Failed to count events"))?;

        let rows = sqlx::query(&format!(
            "SELECT id, name, description, start_date, end_date, timezone, location, \
                    capacity, organizer_id, is_published, is_waitlist_open, created_at, updated_at \
             FROM events WHERE {} \
             ORDER BY start_date ASC \
             LIMIT $4 OFFSET $5",
            where_clause
        ))
        .bind(filter.published_only)
        .bind(filter.upcoming_only)
        .bind(filter.organizer_id.as_deref())
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db("Failed to list events"))?;

        let items: Result<Vec<LiveEvent>, DomainError> =
            rows.into_iter().map(row_to_live_event).collect();

        Ok(LiveEventPage {
            items: items?,
            total,
        })
    }
}

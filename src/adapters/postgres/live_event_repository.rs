//! PostgreSQL implementation of LiveEventRepository.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{DomainError, ErrorCode, LiveEventId, Timestamp};
use crate::domain::live_event::LiveEvent;
use crate::ports::LiveEventRepository;

fn db(context: &str) -> impl Fn(sqlx::Error) -> DomainError + '_ {
    move |e| DomainError::database(context, e)
}

/// Maps an events row to the aggregate.
pub(super) fn row_to_live_event(row: sqlx::postgres::PgRow) -> Result<LiveEvent, DomainError> {
    let id: uuid::Uuid = row.try_get("id").map_err(db("Failed to get id"))?;
    let name: String = row.try_get("name").map_err(db("Failed to get name"))?;
    let description: String = row
        .try_get("description")
        .map_err(db("Failed to get description"))?;
    let start_utc: chrono::DateTime<chrono::Utc> = row
        .try_get("start_date")
        .map_err(db("Failed to get start_date"))?;
    let end_utc: chrono::DateTime<chrono::Utc> = row
        .try_get("end_date")
        .map_err(db("Failed to get end_date"))?;
    let timezone: String = row
        .try_get("timezone")
        .map_err(db("Failed to get timezone"))?;
    let location: String = row
        .try_get("location")
        .map_err(db("Failed to get location"))?;
    let capacity: i32 = row
        .try_get("capacity")
        .map_err(db("Failed to get capacity"))?;
    let organizer_id: String = row
        .try_get("organizer_id")
        .map_err(db("Failed to get organizer_id"))?;
    let is_published: bool = row
        .try_get("is_published")
        .map_err(db("Failed to get is_published"))?;
    let is_waitlist_open: bool = row
        .try_get("is_waitlist_open")
        .map_err(db("Failed to get is_waitlist_open"))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(db("Failed to get created_at"))?;
    let updated_at: chrono::DateTime<chrono::Utc> = row
        .try_get("updated_at")
        .map_err(db("Failed to get updated_at"))?;

    Ok(LiveEvent::reconstitute(
        LiveEventId::from_uuid(id),
        name,
        description,
        Timestamp::from_datetime(start_utc),
        Timestamp::from_datetime(end_utc),
        timezone,
        location,
        capacity,
        organizer_id,
        is_published,
        is_waitlist_open,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}

/// PostgreSQL live-event repository.
#[derive(Clone)]
pub struct PostgresLiveEventRepository {
    pool: PgPool,
}

impl PostgresLiveEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LiveEventRepository for PostgresLiveEventRepository {
    async fn save(&self, event: &LiveEvent) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO events \
             (id, name, description, start_date, end_date, timezone, location, \
              capacity, organizer_id, is_published, is_waitlist_open, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(event.id().as_uuid())
        .bind(event.name())
        .bind(event.description())
        .bind(event.start_utc().as_datetime())
        .bind(event.end_utc().as_datetime())
        .bind(event.timezone())
        .bind(event.location())
        .bind(event.capacity())
        .bind(event.organizer_id())
        .bind(event.is_published())
        .bind(event.is_waitlist_open())
        .bind(event.created_at().as_datetime())
        .bind(event.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db("Failed to insert event"))?;
        Ok(())
    }

    async fn update(&self, event: &LiveEvent) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE events SET \
                 name = $2, description = $3, start_date = $4, end_date = $5, \
                 timezone = $6, location = $7, capacity = $8, is_published = $9, \
                 is_waitlist_open = $10, updated_at = $11 \
             WHERE id = $1",
        )
        .bind(event.id().as_uuid())
        .bind(event.name())
        .bind(event.description())
        .bind(event.start_utc().as_datetime())
        .bind(event.end_utc().as_datetime())
        .bind(event.timezone())
        .bind(event.location())
        .bind(event.capacity())
        .bind(event.is_published())
        .bind(event.is_waitlist_open())
        .bind(event.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db("Failed to update event"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::event_not_found(event.id()));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &LiveEventId) -> Result<Option<LiveEvent>, DomainError> {
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

    async fn delete(&self, id: &LiveEventId) -> Result<(), DomainError> {
        // Guard re-checked in the statement: the row only goes away when no
        // registrations reference it.
        let result = sqlx::query(
            "DELETE FROM events WHERE id = $1 \
             AND NOT EXISTS (SELECT 1 FROM event_registrations WHERE event_id = $1)",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(db("Failed to delete event"))?;

        if result.rows_affected() == 0 {
            let exists: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM events WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(db("Failed to check event existence"))?;
            return Err(match exists {
                Some(_) => DomainError::new(
                    ErrorCode::EventHasRegistrations,
                    format!("Event {} has registrations and cannot be deleted", id),
                ),
                None => DomainError::event_not_found(id),
            });
        }
        Ok(())
    }
}

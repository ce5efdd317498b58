//! PostgreSQL implementation of RegistrationReader.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{
    DomainError, LiveEventId, RegistrationId, Timestamp, UserId,
};
use crate::domain::registration::{Registration, RegistrationStatus};
use crate::ports::{Page, RegistrationPage, RegistrationReader, WaitlistRow};

fn db(context: &str) -> impl Fn(sqlx::Error) -> DomainError + '_ {
    move |e| DomainError::database(context, e)
}

/// Maps a full registration row to the aggregate.
pub(super) fn row_to_registration(row: sqlx::postgres::PgRow) -> Result<Registration, DomainError> {
    let id: uuid::Uuid = row.try_get("id").map_err(db("Failed to get id"))?;
    let event_id: uuid::Uuid = row
        .try_get("event_id")
        .map_err(db("Failed to get event_id"))?;
    let user_id: uuid::Uuid = row
        .try_get("user_id")
        .map_err(db("Failed to get user_id"))?;
    let registered_at: chrono::DateTime<chrono::Utc> = row
        .try_get("registration_date")
        .map_err(db("Failed to get registration_date"))?;
    let status: i16 = row.try_get("status").map_err(db("Failed to get status"))?;
    let position_in_queue: Option<i32> = row
        .try_get("position_in_queue")
        .map_err(db("Failed to get position_in_queue"))?;
    let notes: Option<String> = row.try_get("notes").map_err(db("Failed to get notes"))?;
    let updated_at: chrono::DateTime<chrono::Utc> = row
        .try_get("updated_at")
        .map_err(db("Failed to get updated_at"))?;

    Ok(Registration::reconstitute(
        RegistrationId::from_uuid(id),
        LiveEventId::from_uuid(event_id),
        UserId::from_uuid(user_id),
        Timestamp::from_datetime(registered_at),
        RegistrationStatus::from_i16(status)?,
        position_in_queue,
        notes,
        Timestamp::from_datetime(updated_at),
    ))
}

/// PostgreSQL registration reader (no write paths).
#[derive(Clone)]
pub struct PostgresRegistrationReader {
    pool: PgPool,
}

impl PostgresRegistrationReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistrationReader for PostgresRegistrationReader {
    async fn list_for_event(
        &self,
        live_event_id: &LiveEventId,
        status: Option<RegistrationStatus>,
        page: Page,
    ) -> Result<RegistrationPage, DomainError> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_registrations \
             WHERE event_id = $1 AND ($2::smallint IS NULL OR status = $2)",
        )
        .bind(live_event_id.as_uuid())
        .bind(status.map(|s| s.as_i16()))
        .fetch_one(&self.pool)
        .await
        .map_err(db("Failed to count registrations"))?;

        let rows = sqlx::query(
            "SELECT id, event_id, user_id, registration_date, status, \
                    position_in_queue, notes, updated_at \
             FROM event_registrations \
             WHERE event_id = $1 AND ($2::smallint IS NULL OR status = $2) \
             ORDER BY registration_date ASC, id ASC \
             LIMIT $3 OFFSET $4",
        )
        .bind(live_event_id.as_uuid())
        .bind(status.map(|s| s.as_i16()))
        .bind(page.limit as i64)
        .bind(page.offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db("Failed to list registrations"))?;

        let items: Result<Vec<Registration>, DomainError> =
            rows.into_iter().map(row_to_registration).collect();

        Ok(RegistrationPage {
            items: items?,
            total,
        })
    }

    async fn waitlist_for_event(
        &self,
        live_event_id: &LiveEventId,
    ) -> Result<Vec<WaitlistRow>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, user_id, position_in_queue, registration_date \
             FROM event_registrations \
             WHERE event_id = $1 AND status = $2 \
             ORDER BY position_in_queue ASC",
        )
        .bind(live_event_id.as_uuid())
        .bind(RegistrationStatus::Waitlisted.as_i16())
        .fetch_all(&self.pool)
        .await
        .map_err(db("Failed to load waitlist"))?;

        rows.into_iter()
            .map(|row| {
                let id: uuid::Uuid = row.try_get("id").map_err(db("Failed to get id"))?;
                let user_id: uuid::Uuid = row
                    .try_get("user_id")
                    .map_err(db("Failed to get user_id"))?;
                let position: i32 = row
                    .try_get("position_in_queue")
                    .map_err(db("Failed to get position"))?;
                let registered_at: chrono::DateTime<chrono::Utc> = row
                    .try_get("registration_date")
                    .map_err(db("Failed to get registration_date"))?;
                Ok(WaitlistRow {
                    registration_id: RegistrationId::from_uuid(id),
                    user_id: UserId::from_uuid(user_id),
                    position,
                    registered_at: Timestamp::from_datetime(registered_at),
                })
            })
            .collect()
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Registration>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, event_id, user_id, registration_date, status, \
                    position_in_queue, notes, updated_at \
             FROM event_registrations \
             WHERE user_id = $1 \
             ORDER BY registration_date DESC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db("Failed to list user registrations"))?;

        rows.into_iter().map(row_to_registration).collect()
    }

    async fn count_for_event(&self, live_event_id: &LiveEventId) -> Result<i64, DomainError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM event_registrations WHERE event_id = $1")
                .bind(live_event_id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(db("Failed to count registrations"))?;
        Ok(count)
    }

    async fn confirmed_count(&self, live_event_id: &LiveEventId) -> Result<i64, DomainError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM event_registrations WHERE event_id = $1 AND status = $2",
        )
        .bind(live_event_id.as_uuid())
        .bind(RegistrationStatus::Confirmed.as_i16())
        .fetch_one(&self.pool)
        .await
        .map_err(db("Failed to count confirmed registrations"))?;
        Ok(count)
    }
}

//! PostgreSQL implementation of OutboxStore.
//!
//! The claim statement updates up to N due rows selected with
//! `FOR UPDATE SKIP LOCKED`, so horizontally scaled workers never pick the
//! same row. A row is due when Pending, or Failed with retry budget left
//! and its scheduled attempt time reached.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope, Timestamp};
use crate::ports::{OutboxMessage, OutboxStatus, OutboxStore};

fn db(context: &str) -> impl Fn(sqlx::Error) -> DomainError + '_ {
    move |e| DomainError::database(context, e)
}

fn status_to_str(status: OutboxStatus) -> &'static str {
    match status {
        OutboxStatus::Pending => "pending",
        OutboxStatus::Claimed => "claimed",
        OutboxStatus::Processed => "processed",
        OutboxStatus::Failed => "failed",
    }
}

fn str_to_status(s: &str) -> Result<OutboxStatus, DomainError> {
    match s {
        "pending" => Ok(OutboxStatus::Pending),
        "claimed" => Ok(OutboxStatus::Claimed),
        "processed" => Ok(OutboxStatus::Processed),
        "failed" => Ok(OutboxStatus::Failed),
        other => Err(DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid outbox status: {}", other),
        )),
    }
}

fn row_to_message(row: sqlx::postgres::PgRow) -> Result<OutboxMessage, DomainError> {
    let id: Uuid = row.try_get("id").map_err(db("Failed to get id"))?;
    let created_at: chrono::DateTime<chrono::Utc> = row
        .try_get("created_at")
        .map_err(db("Failed to get created_at"))?;
    let event_type: String = row
        .try_get("event_type")
        .map_err(db("Failed to get event_type"))?;
    let payload: serde_json::Value = row
        .try_get("payload")
        .map_err(db("Failed to get payload"))?;
    let occurred_on: chrono::DateTime<chrono::Utc> = row
        .try_get("occurred_on")
        .map_err(db("Failed to get occurred_on"))?;
    let status: String = row.try_get("status").map_err(db("Failed to get status"))?;
    let try_count: i32 = row
        .try_get("try_count")
        .map_err(db("Failed to get try_count"))?;
    let last_error: Option<String> = row
        .try_get("last_error")
        .map_err(db("Failed to get last_error"))?;
    let next_attempt_at: Option<chrono::DateTime<chrono::Utc>> = row
        .try_get("next_attempt_at")
        .map_err(db("Failed to get next_attempt_at"))?;
    let claimed_by: Option<String> = row
        .try_get("claimed_by")
        .map_err(db("Failed to get claimed_by"))?;
    let claimed_at: Option<chrono::DateTime<chrono::Utc>> = row
        .try_get("claimed_at")
        .map_err(db("Failed to get claimed_at"))?;

    let envelope: EventEnvelope = serde_json::from_value(payload).map_err(|e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Outbox payload is not an envelope: {}", e),
        )
    })?;

    Ok(OutboxMessage {
        id,
        created_at: Timestamp::from_datetime(created_at),
        event_type,
        envelope,
        occurred_on: Timestamp::from_datetime(occurred_on),
        status: str_to_status(&status)?,
        try_count,
        last_error,
        next_attempt_at: next_attempt_at.map(Timestamp::from_datetime),
        claimed_by,
        claimed_at: claimed_at.map(Timestamp::from_datetime),
    })
}

/// Writes outbox rows inside a store transaction. This is the transactional
/// half of the outbox guarantee; `PostgresRegistrationStore` calls it before
/// committing a state change.
pub(super) async fn insert_outbox_rows(
    txn: &mut Transaction<'_, Postgres>,
    envelopes: &[EventEnvelope],
) -> Result<(), DomainError> {
    for envelope in envelopes {
        let message = OutboxMessage::pending(envelope.clone());
        let payload = serde_json::to_value(envelope).map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to serialize envelope: {}", e),
            )
        })?;

        sqlx::query(
            "INSERT INTO outbox_messages \
             (id, created_at, event_type, payload, occurred_on, status, try_count) \
             VALUES ($1, $2, $3, $4, $5, $6, 0)",
        )
        .bind(message.id)
        .bind(message.created_at.as_datetime())
        .bind(&message.event_type)
        .bind(payload)
        .bind(message.occurred_on.as_datetime())
        .bind(status_to_str(OutboxStatus::Pending))
        .execute(&mut **txn)
        .await
        .map_err(db("Failed to insert outbox row"))?;
    }
    Ok(())
}

/// PostgreSQL outbox store.
#[derive(Clone)]
pub struct PostgresOutboxStore {
    pool: PgPool,
}

impl PostgresOutboxStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutboxStore for PostgresOutboxStore {
    async fn enqueue(&self, envelopes: &[EventEnvelope]) -> Result<(), DomainError> {
        let mut txn = self
            .pool
            .begin()
            .await
            .map_err(db("Failed to begin outbox enqueue"))?;
        insert_outbox_rows(&mut txn, envelopes).await?;
        txn.commit()
            .await
            .map_err(db("Failed to commit outbox enqueue"))?;
        Ok(())
    }

    async fn claim_batch(
        &self,
        limit: u32,
        claimed_by: &str,
        max_tries: i32,
    ) -> Result<Vec<OutboxMessage>, DomainError> {
        let rows = sqlx::query(
            "UPDATE outbox_messages \
             SET status = 'claimed', claimed_by = $2, claimed_at = NOW() \
             WHERE id IN ( \
                 SELECT id FROM outbox_messages \
                 WHERE (status = 'pending' \
                        OR (status = 'failed' AND try_count < $3 \
                            AND (next_attempt_at IS NULL OR next_attempt_at <= NOW()))) \
                 ORDER BY created_at ASC \
                 LIMIT $1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING id, created_at, event_type, payload, occurred_on, status, \
                       try_count, last_error, next_attempt_at, claimed_by, claimed_at",
        )
        .bind(limit as i64)
        .bind(claimed_by)
        .bind(max_tries)
        .fetch_all(&self.pool)
        .await
        .map_err(db("Failed to claim outbox batch"))?;

        rows.into_iter().map(row_to_message).collect()
    }

    async fn mark_processed(&self, id: Uuid) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE outbox_messages \
             SET status = 'processed', try_count = try_count + 1, \
                 claimed_by = NULL, claimed_at = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db("Failed to mark outbox row processed"))?;
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        next_attempt_at: Timestamp,
    ) -> Result<(), DomainError> {
        sqlx::query(
            "UPDATE outbox_messages \
             SET status = 'failed', try_count = try_count + 1, last_error = $2, \
                 next_attempt_at = $3, claimed_by = NULL, claimed_at = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .bind(next_attempt_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db("Failed to mark outbox row failed"))?;
        Ok(())
    }

    async fn release_stuck(&self, claimed_before: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "UPDATE outbox_messages \
             SET status = 'pending', claimed_by = NULL, claimed_at = NULL \
             WHERE status = 'claimed' AND claimed_at < $1",
        )
        .bind(claimed_before.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db("Failed to release stuck outbox claims"))?;
        Ok(result.rows_affected())
    }

    async fn delete_processed_before(&self, older_than: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query(
            "DELETE FROM outbox_messages WHERE status = 'processed' AND created_at < $1",
        )
        .bind(older_than.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db("Failed to clean up processed outbox rows"))?;
        Ok(result.rows_affected())
    }

    async fn dead_letters(
        &self,
        limit: u32,
        max_tries: i32,
    ) -> Result<Vec<OutboxMessage>, DomainError> {
        let rows = sqlx::query(
            "SELECT id, created_at, event_type, payload, occurred_on, status, \
                    try_count, last_error, next_attempt_at, claimed_by, claimed_at \
             FROM outbox_messages \
             WHERE status = 'failed' AND try_count >= $2 \
             ORDER BY created_at ASC \
             LIMIT $1",
        )
        .bind(limit as i64)
        .bind(max_tries)
        .fetch_all(&self.pool)
        .await
        .map_err(db("Failed to list dead letters"))?;

        rows.into_iter().map(row_to_message).collect()
    }
}

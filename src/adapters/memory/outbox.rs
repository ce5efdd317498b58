//! In-memory OutboxStore.
//!
//! Same claiming discipline as the postgres backend: a row is due when
//! Pending, or Failed with retry budget left and its backoff elapsed.
//! The state mutex provides the claim atomicity that `FOR UPDATE SKIP
//! LOCKED` provides in SQL.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope, Timestamp};
use crate::ports::{OutboxMessage, OutboxStatus, OutboxStore};

use super::state::InMemoryStore;

fn is_due(row: &OutboxMessage, now: &Timestamp, max_tries: i32) -> bool {
    match row.status {
        OutboxStatus::Pending => true,
        OutboxStatus::Failed => {
            row.try_count < max_tries
                && row
                    .next_attempt_at
                    .map_or(true, |at| !at.is_after(now))
        }
        OutboxStatus::Claimed | OutboxStatus::Processed => false,
    }
}

#[async_trait]
impl OutboxStore for InMemoryStore {
    async fn enqueue(&self, envelopes: &[EventEnvelope]) -> Result<(), DomainError> {
        let mut state = self.inner.lock().await;
        for envelope in envelopes {
            state.outbox.push(OutboxMessage::pending(envelope.clone()));
        }
        Ok(())
    }

    async fn claim_batch(
        &self,
        limit: u32,
        claimed_by: &str,
        max_tries: i32,
    ) -> Result<Vec<OutboxMessage>, DomainError> {
        let mut state = self.inner.lock().await;
        let now = Timestamp::now();

        let mut claimed = Vec::new();
        for row in state.outbox.iter_mut() {
            if claimed.len() >= limit as usize {
                break;
            }
            if is_due(row, &now, max_tries) {
                row.status = OutboxStatus::Claimed;
                row.claimed_by = Some(claimed_by.to_string());
                row.claimed_at = Some(now);
                claimed.push(row.clone());
            }
        }
        Ok(claimed)
    }

    async fn mark_processed(&self, id: Uuid) -> Result<(), DomainError> {
        let mut state = self.inner.lock().await;
        let row = state
            .outbox
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::InternalError, format!("Unknown outbox row {}", id))
            })?;
        row.status = OutboxStatus::Processed;
        row.try_count += 1;
        row.claimed_by = None;
        row.claimed_at = None;
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        error: &str,
        next_attempt_at: Timestamp,
    ) -> Result<(), DomainError> {
        let mut state = self.inner.lock().await;
        let row = state
            .outbox
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::InternalError, format!("Unknown outbox row {}", id))
            })?;
        row.status = OutboxStatus::Failed;
        row.try_count += 1;
        row.last_error = Some(error.to_string());
        row.next_attempt_at = Some(next_attempt_at);
        row.claimed_by = None;
        row.claimed_at = None;
        Ok(())
    }

    async fn release_stuck(&self, claimed_before: Timestamp) -> Result<u64, DomainError> {
        let mut state = self.inner.lock().await;
        let mut released = 0;
        for row in state.outbox.iter_mut() {
            if row.status == OutboxStatus::Claimed
                && row.claimed_at.map_or(true, |at| at.is_before(&claimed_before))
            {
                row.status = OutboxStatus::Pending;
                row.claimed_by = None;
                row.claimed_at = None;
                released += 1;
            }
        }
        Ok(released)
    }

    async fn delete_processed_before(&self, older_than: Timestamp) -> Result<u64, DomainError> {
        let mut state = self.inner.lock().await;
        let before = state.outbox.len();
        state.outbox.retain(|r| {
            !(r.status == OutboxStatus::Processed && r.created_at.is_before(&older_than))
        });
        Ok((before - state.outbox.len()) as u64)
    }

    async fn dead_letters(
        &self,
        limit: u32,
        max_tries: i32,
    ) -> Result<Vec<OutboxMessage>, DomainError> {
        let state = self.inner.lock().await;
        Ok(state
            .outbox
            .iter()
            .filter(|r| r.status == OutboxStatus::Failed && r.try_count >= max_tries)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

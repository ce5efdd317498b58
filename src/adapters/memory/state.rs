//! Shared state behind the in-memory store.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::foundation::{LiveEventId, RegistrationId, UserId};
use crate::domain::live_event::LiveEvent;
use crate::domain::registration::{Registration, RegistrationStatus};
use crate::domain::user::User;
use crate::ports::OutboxMessage;

/// All tables of the in-memory backend.
#[derive(Debug, Default)]
pub(super) struct StoreState {
    pub events: HashMap<LiveEventId, LiveEvent>,
    pub users: HashMap<UserId, User>,
    pub registrations: HashMap<RegistrationId, Registration>,
    pub outbox: Vec<OutboxMessage>,
}

impl StoreState {
    /// Active (non-cancelled) registration of `user_id` for `event_id`.
    pub fn active_registration(
        &self,
        event_id: &LiveEventId,
        user_id: &UserId,
    ) -> Option<&Registration> {
        self.registrations.values().find(|r| {
            r.live_event_id() == event_id && r.user_id() == user_id && r.status().is_active()
        })
    }

    pub fn confirmed_count(&self, event_id: &LiveEventId) -> i64 {
        self.registrations
            .values()
            .filter(|r| {
                r.live_event_id() == event_id && r.status() == RegistrationStatus::Confirmed
            })
            .count() as i64
    }

    pub fn max_waitlist_position(&self, event_id: &LiveEventId) -> Option<i32> {
        self.registrations
            .values()
            .filter(|r| {
                r.live_event_id() == event_id && r.status() == RegistrationStatus::Waitlisted
            })
            .filter_map(|r| r.position_in_queue())
            .max()
    }

    /// Waitlisted rows of one event as planner entries.
    pub fn waitlist_entries(
        &self,
        event_id: &LiveEventId,
    ) -> Vec<crate::domain::registration::waitlist::WaitlistEntry> {
        self.registrations
            .values()
            .filter(|r| {
                r.live_event_id() == event_id && r.status() == RegistrationStatus::Waitlisted
            })
            .map(|r| crate::domain::registration::waitlist::WaitlistEntry {
                registration_id: *r.id(),
                user_id: *r.user_id(),
                position: r.position_in_queue().unwrap_or(0),
                registered_at: *r.registered_at(),
            })
            .collect()
    }
}

/// Single-node in-memory backend.
///
/// Implements every store port against plain maps. One mutex serializes all
/// operations, which subsumes the per-event advisory lock the postgres
/// backend takes; dev and test deployments trade lock granularity for
/// simplicity.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    pub(super) inner: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outbox rows in any status (test observability).
    pub async fn outbox_len(&self) -> usize {
        self.inner.lock().await.outbox.len()
    }

    /// Clone of the whole outbox table (test observability).
    pub async fn outbox_rows(&self) -> Vec<OutboxMessage> {
        self.inner.lock().await.outbox.clone()
    }

    /// Make every failed row's scheduled retry due immediately, without
    /// touching its try count (test clock control).
    pub async fn force_retries_due(&self) {
        use crate::domain::foundation::Timestamp;
        use crate::ports::OutboxStatus;

        let mut state = self.inner.lock().await;
        let past = Timestamp::now().minus_secs(1);
        for row in state.outbox.iter_mut() {
            if row.status == OutboxStatus::Failed {
                row.next_attempt_at = Some(past);
            }
        }
    }

    /// Clone of every registration row for one event (test observability).
    pub async fn registrations_for(&self, event_id: &LiveEventId) -> Vec<Registration> {
        self.inner
            .lock()
            .await
            .registrations
            .values()
            .filter(|r| r.live_event_id() == event_id)
            .cloned()
            .collect()
    }
}

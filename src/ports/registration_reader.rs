//! RegistrationReader port - read-only registration queries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, LiveEventId, RegistrationId, Timestamp, UserId};
use crate::domain::registration::{Registration, RegistrationStatus};

use super::Page;

/// One row of an admin waitlist view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitlistRow {
    pub registration_id: RegistrationId,
    pub user_id: UserId,
    pub position: i32,
    pub registered_at: Timestamp,
}

/// A page of registrations plus the unpaginated total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationPage {
    pub items: Vec<Registration>,
    pub total: i64,
}

/// Port for read-only registration queries.
#[async_trait]
pub trait RegistrationReader: Send + Sync {
    /// List registrations for an event, optionally filtered by status,
    /// ordered by registration date ascending.
    async fn list_for_event(
        &self,
        live_event_id: &LiveEventId,
        status: Option<RegistrationStatus>,
        page: Page,
    ) -> Result<RegistrationPage, DomainError>;

    /// The event's waitlist in position order.
    async fn waitlist_for_event(
        &self,
        live_event_id: &LiveEventId,
    ) -> Result<Vec<WaitlistRow>, DomainError>;

    /// All registrations of one user (DSAR export), newest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Registration>, DomainError>;

    /// Total number of registration rows for an event, any status.
    /// Used by the delete-event guard.
    async fn count_for_event(&self, live_event_id: &LiveEventId) -> Result<i64, DomainError>;

    /// Number of confirmed rows for an event.
    async fn confirmed_count(&self, live_event_id: &LiveEventId) -> Result<i64, DomainError>;
}

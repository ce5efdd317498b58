//! LiveEventRepository port - write-side persistence for events.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, LiveEventId};
use crate::domain::live_event::LiveEvent;

/// Port for persisting LiveEvent aggregates.
///
/// Write paths only; query paths go through `LiveEventReader` so reads never
/// carry mutation machinery.
#[async_trait]
pub trait LiveEventRepository: Send + Sync {
    /// Insert a new event.
    async fn save(&self, event: &LiveEvent) -> Result<(), DomainError>;

    /// Update an existing event.
    ///
    /// # Errors
    ///
    /// - `EventNotFound` if no row was updated
    async fn update(&self, event: &LiveEvent) -> Result<(), DomainError>;

    /// Load an event by id.
    async fn find_by_id(&self, id: &LiveEventId) -> Result<Option<LiveEvent>, DomainError>;

    /// Delete an event.
    ///
    /// Callers must check the no-registrations precondition first; the
    /// implementation re-checks and fails with `EventHasRegistrations` to
    /// close the race.
    async fn delete(&self, id: &LiveEventId) -> Result<(), DomainError>;
}

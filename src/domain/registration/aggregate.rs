//! Registration aggregate entity.
//!
//! A registration connects a user to a live event with a lifecycle status.
//! Rows are never physically deleted; cancellation is a status transition.
//!
//! # Invariants
//!
//! - `position_in_queue` is `Some` if and only if `status == Waitlisted`
//! - at most one non-Cancelled registration per (event, user) — enforced by
//!   the store inside the admission transaction

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    DomainError, ErrorCode, LiveEventId, RegistrationId, Timestamp, UserId,
};

use super::RegistrationStatus;

/// Registration aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    id: RegistrationId,
    live_event_id: LiveEventId,
    user_id: UserId,
    registered_at: Timestamp,
    status: RegistrationStatus,
    position_in_queue: Option<i32>,
    notes: Option<String>,
    updated_at: Timestamp,
}

impl Registration {
    /// Create a confirmed registration (a free seat was available).
    pub fn confirmed(
        id: RegistrationId,
        live_event_id: LiveEventId,
        user_id: UserId,
        notes: Option<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            live_event_id,
            user_id,
            registered_at: now,
            status: RegistrationStatus::Confirmed,
            position_in_queue: None,
            notes,
            updated_at: now,
        }
    }

    /// Create a waitlisted registration at the given 1-based position.
    pub fn waitlisted(
        id: RegistrationId,
        live_event_id: LiveEventId,
        user_id: UserId,
        position: i32,
        notes: Option<String>,
    ) -> Self {
        debug_assert!(position >= 1);
        let now = Timestamp::now();
        Self {
            id,
            live_event_id,
            user_id,
            registered_at: now,
            status: RegistrationStatus::Waitlisted,
            position_in_queue: Some(position),
            notes,
            updated_at: now,
        }
    }

    /// Reconstitute a registration from persistence.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: RegistrationId,
        live_event_id: LiveEventId,
        user_id: UserId,
        registered_at: Timestamp,
        status: RegistrationStatus,
        position_in_queue: Option<i32>,
        notes: Option<String>,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            live_event_id,
            user_id,
            registered_at,
            status,
            position_in_queue,
            notes,
            updated_at,
        }
    }

    pub fn id(&self) -> &RegistrationId {
        &self.id
    }

    pub fn live_event_id(&self) -> &LiveEventId {
        &self.live_event_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn registered_at(&self) -> &Timestamp {
        &self.registered_at
    }

    pub fn status(&self) -> RegistrationStatus {
        self.status
    }

    pub fn position_in_queue(&self) -> Option<i32> {
        self.position_in_queue
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Checks if the given user owns this registration.
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────

    /// Cancel from any non-Cancelled state.
    ///
    /// Returns the waitlist position the row held, if any, so the caller can
    /// emit a waitlist-removal event.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if already cancelled
    pub fn cancel(&mut self) -> Result<Option<i32>, DomainError> {
        if self.status == RegistrationStatus::Cancelled {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Registration is already cancelled",
            ));
        }
        let freed_position = self.position_in_queue.take();
        self.status = RegistrationStatus::Cancelled;
        self.updated_at = Timestamp::now();
        Ok(freed_position)
    }

    /// Promote to Confirmed (waitlist promotion or admin confirm).
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` unless currently Pending or Waitlisted
    pub fn promote(&mut self) -> Result<(), DomainError> {
        if !self.status.is_promotable() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot promote a {} registration", self.status),
            ));
        }
        self.status = RegistrationStatus::Confirmed;
        self.position_in_queue = None;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Move to a new waitlist position during reindexing.
    ///
    /// # Errors
    ///
    /// - `InternalError` if the row is not waitlisted; reindexing a
    ///   non-waitlisted row is a programmer error
    pub fn reposition(&mut self, new_position: i32) -> Result<(), DomainError> {
        if self.status != RegistrationStatus::Waitlisted {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                format!("Cannot reindex a {} registration", self.status),
            ));
        }
        self.position_in_queue = Some(new_position);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Mark attendance after the event (admin bookkeeping).
    pub fn mark_attended(&mut self) -> Result<(), DomainError> {
        self.transition_from_confirmed(RegistrationStatus::Attended)
    }

    /// Mark a no-show after the event (admin bookkeeping).
    pub fn mark_no_show(&mut self) -> Result<(), DomainError> {
        self.transition_from_confirmed(RegistrationStatus::NoShow)
    }

    fn transition_from_confirmed(&mut self, target: RegistrationStatus) -> Result<(), DomainError> {
        if self.status != RegistrationStatus::Confirmed {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot mark a {} registration as {}", self.status, target),
            ));
        }
        self.status = target;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waitlisted_row(position: i32) -> Registration {
        Registration::waitlisted(
            RegistrationId::new(),
            LiveEventId::new(),
            UserId::new(),
            position,
            None,
        )
    }

    #[test]
    fn confirmed_row_has_no_position() {
        let reg = Registration::confirmed(
            RegistrationId::new(),
            LiveEventId::new(),
            UserId::new(),
            Some("vegan".to_string()),
        );
        assert_eq!(reg.status(), RegistrationStatus::Confirmed);
        assert!(reg.position_in_queue().is_none());
        assert_eq!(reg.notes(), Some("vegan"));
    }

    #[test]
    fn waitlisted_row_has_position() {
        let reg = waitlisted_row(3);
        assert_eq!(reg.status(), RegistrationStatus::Waitlisted);
        assert_eq!(reg.position_in_queue(), Some(3));
    }

    #[test]
    fn cancel_returns_freed_position() {
        let mut reg = waitlisted_row(2);
        let freed = reg.cancel().unwrap();
        assert_eq!(freed, Some(2));
        assert_eq!(reg.status(), RegistrationStatus::Cancelled);
        assert!(reg.position_in_queue().is_none());
    }

    #[test]
    fn cancel_of_confirmed_frees_nothing() {
        let mut reg = Registration::confirmed(
            RegistrationId::new(),
            LiveEventId::new(),
            UserId::new(),
            None,
        );
        assert_eq!(reg.cancel().unwrap(), None);
    }

    #[test]
    fn cancel_twice_fails() {
        let mut reg = waitlisted_row(1);
        reg.cancel().unwrap();
        assert!(reg.cancel().is_err());
    }

    #[test]
    fn promote_clears_position() {
        let mut reg = waitlisted_row(1);
        reg.promote().unwrap();
        assert_eq!(reg.status(), RegistrationStatus::Confirmed);
        assert!(reg.position_in_queue().is_none());
    }

    #[test]
    fn promote_cancelled_fails() {
        let mut reg = waitlisted_row(1);
        reg.cancel().unwrap();
        assert!(reg.promote().is_err());
    }

    #[test]
    fn reposition_requires_waitlisted() {
        let mut reg = Registration::confirmed(
            RegistrationId::new(),
            LiveEventId::new(),
            UserId::new(),
            None,
        );
        let err = reg.reposition(1).unwrap_err();
        assert_eq!(err.code, ErrorCode::InternalError);
    }

    #[test]
    fn attendance_transitions_from_confirmed_only() {
        let mut reg = waitlisted_row(1);
        assert!(reg.mark_attended().is_err());

        reg.promote().unwrap();
        reg.mark_attended().unwrap();
        assert_eq!(reg.status(), RegistrationStatus::Attended);
    }
}

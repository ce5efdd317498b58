//! LiveEvent aggregate entity.
//!
//! A live event is a scheduled gathering users can register for. The
//! aggregate owns the capacity/visibility rules that gate registration;
//! registrations themselves are stored as peers keyed by event id so rows
//! can be written concurrently.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, LiveEventId, Timestamp};

/// Validated field-length and capacity limits.
///
/// Defaults follow the recognized configuration options; deployments may
/// tighten them through the `limits` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLimits {
    pub capacity_max: i32,
    pub title_max: usize,
    pub description_max: usize,
    pub location_max: usize,
}

impl Default for EventLimits {
    fn default() -> Self {
        Self {
            capacity_max: 10_000,
            title_max: 200,
            description_max: 4_000,
            location_max: 500,
        }
    }
}

/// Mutable attributes accepted by `LiveEvent::update`.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_utc: Option<Timestamp>,
    pub end_utc: Option<Timestamp>,
    pub timezone: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub is_waitlist_open: Option<bool>,
}

/// Outcome of a capacity change, used by the update handler to decide
/// whether a promotion pass is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityChange {
    Unchanged,
    /// Capacity grew by `additional` seats.
    Increased { additional: i32 },
    /// Capacity shrank; confirmed rows above the new capacity are tolerated.
    Decreased,
}

/// LiveEvent aggregate.
///
/// # Invariants
///
/// - `end_utc > start_utc`
/// - `1 <= capacity <= limits.capacity_max`
/// - `capacity >= confirmed_count` is NOT enforced: capacity may shrink
///   administratively and surplus confirmed rows are tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveEvent {
    id: LiveEventId,
    name: String,
    description: String,
    start_utc: Timestamp,
    end_utc: Timestamp,
    timezone: String,
    location: String,
    capacity: i32,
    organizer_id: String,
    is_published: bool,
    is_waitlist_open: bool,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl LiveEvent {
    /// Create a new unpublished event.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` on empty/oversized fields, non-positive or
    ///   over-limit capacity, or `end_utc <= start_utc`
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: LiveEventId,
        name: String,
        description: String,
        start_utc: Timestamp,
        end_utc: Timestamp,
        timezone: String,
        location: String,
        capacity: i32,
        organizer_id: String,
        limits: &EventLimits,
    ) -> Result<Self, DomainError> {
        Self::validate_name(&name, limits)?;
        Self::validate_description(&description, limits)?;
        Self::validate_location(&location, limits)?;
        Self::validate_schedule(&start_utc, &end_utc)?;
        Self::validate_capacity(capacity, limits)?;
        if timezone.trim().is_empty() {
            return Err(DomainError::validation("timezone", "Timezone cannot be empty"));
        }

        let now = Timestamp::now();
        Ok(Self {
            id,
            name,
            description,
            start_utc,
            end_utc,
            timezone,
            location,
            capacity,
            organizer_id,
            is_published: false,
            is_waitlist_open: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitute an event from persistence (no validation, no events).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: LiveEventId,
        name: String,
        description: String,
        start_utc: Timestamp,
        end_utc: Timestamp,
        timezone: String,
        location: String,
        capacity: i32,
        organizer_id: String,
        is_published: bool,
        is_waitlist_open: bool,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            name,
            description,
            start_utc,
            end_utc,
            timezone,
            location,
            capacity,
            organizer_id,
            is_published,
            is_waitlist_open,
            created_at,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &LiveEventId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn start_utc(&self) -> &Timestamp {
        &self.start_utc
    }

    pub fn end_utc(&self) -> &Timestamp {
        &self.end_utc
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    pub fn organizer_id(&self) -> &str {
        &self.organizer_id
    }

    pub fn is_published(&self) -> bool {
        self.is_published
    }

    pub fn is_waitlist_open(&self) -> bool {
        self.is_waitlist_open
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Checks if the given identity subject organizes this event.
    pub fn is_organizer(&self, subject: &str) -> bool {
        self.organizer_id == subject
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration gating
    // ─────────────────────────────────────────────────────────────────────────

    /// Validates that this event currently accepts registrations.
    ///
    /// # Errors
    ///
    /// - `EventNotPublished` if the event is not visible
    /// - `EventAlreadyStarted` if `start_utc <= now`
    pub fn ensure_accepts_registrations(&self, now: &Timestamp) -> Result<(), DomainError> {
        if !self.is_published {
            return Err(DomainError::new(
                ErrorCode::EventNotPublished,
                format!("Event {} is not published", self.id),
            ));
        }
        if !self.start_utc.is_after(now) {
            return Err(DomainError::new(
                ErrorCode::EventAlreadyStarted,
                format!("Event {} has already started", self.id),
            ));
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Publish the event. Idempotent; returns whether visibility changed.
    pub fn publish(&mut self) -> bool {
        if self.is_published {
            return false;
        }
        self.is_published = true;
        self.updated_at = Timestamp::now();
        true
    }

    /// Unpublish the event. Idempotent; returns whether visibility changed.
    pub fn unpublish(&mut self) -> bool {
        if !self.is_published {
            return false;
        }
        self.is_published = false;
        self.updated_at = Timestamp::now();
        true
    }

    /// Apply a patch of mutable attributes.
    ///
    /// Returns the capacity change so the caller can run a promotion pass
    /// when seats were added. Decreasing capacity below the confirmed count
    /// is allowed and never cancels anyone.
    pub fn update(
        &mut self,
        patch: EventPatch,
        limits: &EventLimits,
    ) -> Result<CapacityChange, DomainError> {
        let start = patch.start_utc.unwrap_or(self.start_utc);
        let end = patch.end_utc.unwrap_or(self.end_utc);
        Self::validate_schedule(&start, &end)?;

        if let Some(name) = &patch.name {
            Self::validate_name(name, limits)?;
        }
        if let Some(description) = &patch.description {
            Self::validate_description(description, limits)?;
        }
        if let Some(location) = &patch.location {
            Self::validate_location(location, limits)?;
        }
        if let Some(capacity) = patch.capacity {
            Self::validate_capacity(capacity, limits)?;
        }
        if let Some(timezone) = &patch.timezone {
            if timezone.trim().is_empty() {
                return Err(DomainError::validation("timezone", "Timezone cannot be empty"));
            }
        }

        let change = match patch.capacity {
            Some(new) if new > self.capacity => CapacityChange::Increased {
                additional: new - self.capacity,
            },
            Some(new) if new < self.capacity => CapacityChange::Decreased,
            _ => CapacityChange::Unchanged,
        };

        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(timezone) = patch.timezone {
            self.timezone = timezone;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(capacity) = patch.capacity {
            self.capacity = capacity;
        }
        if let Some(open) = patch.is_waitlist_open {
            self.is_waitlist_open = open;
        }
        self.start_utc = start;
        self.end_utc = end;
        self.updated_at = Timestamp::now();

        Ok(change)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn validate_name(name: &str, limits: &EventLimits) -> Result<(), DomainError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("name", "Name cannot be empty"));
        }
        if trimmed.len() > limits.title_max {
            return Err(DomainError::validation(
                "name",
                format!("Name must be {} characters or less", limits.title_max),
            ));
        }
        Ok(())
    }

    fn validate_description(description: &str, limits: &EventLimits) -> Result<(), DomainError> {
        if description.len() > limits.description_max {
            return Err(DomainError::validation(
                "description",
                format!(
                    "Description must be {} characters or less",
                    limits.description_max
                ),
            ));
        }
        Ok(())
    }

    fn validate_location(location: &str, limits: &EventLimits) -> Result<(), DomainError> {
        if location.len() > limits.location_max {
            return Err(DomainError::validation(
                "location",
                format!("Location must be {} characters or less", limits.location_max),
            ));
        }
        Ok(())
    }

    fn validate_schedule(start: &Timestamp, end: &Timestamp) -> Result<(), DomainError> {
        if !end.is_after(start) {
            return Err(DomainError::validation(
                "end_utc",
                "Event end must be after its start",
            ));
        }
        Ok(())
    }

    fn validate_capacity(capacity: i32, limits: &EventLimits) -> Result<(), DomainError> {
        if capacity < 1 || capacity > limits.capacity_max {
            return Err(DomainError::validation(
                "capacity",
                format!("Capacity must be between 1 and {}", limits.capacity_max),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_event(capacity: i32) -> LiveEvent {
        let start = Timestamp::now().plus_hours(24);
        let end = start.plus_hours(2);
        LiveEvent::new(
            LiveEventId::new(),
            "Rust Meetup".to_string(),
            "Monthly meetup".to_string(),
            start,
            end,
            "Europe/Berlin".to_string(),
            "Main Hall".to_string(),
            capacity,
            "organizer-1".to_string(),
            &EventLimits::default(),
        )
        .unwrap()
    }

    #[test]
    fn new_event_is_unpublished() {
        let event = test_event(10);
        assert!(!event.is_published());
        assert!(event.is_waitlist_open());
    }

    #[test]
    fn new_event_rejects_empty_name() {
        let start = Timestamp::now().plus_hours(1);
        let result = LiveEvent::new(
            LiveEventId::new(),
            "  ".to_string(),
            String::new(),
            start,
            start.plus_hours(1),
            "UTC".to_string(),
            String::new(),
            5,
            "org".to_string(),
            &EventLimits::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn new_event_rejects_end_before_start() {
        let start = Timestamp::now().plus_hours(2);
        let result = LiveEvent::new(
            LiveEventId::new(),
            "Event".to_string(),
            String::new(),
            start,
            start.minus_secs(60),
            "UTC".to_string(),
            String::new(),
            5,
            "org".to_string(),
            &EventLimits::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn new_event_rejects_zero_capacity() {
        let start = Timestamp::now().plus_hours(1);
        let result = LiveEvent::new(
            LiveEventId::new(),
            "Event".to_string(),
            String::new(),
            start,
            start.plus_hours(1),
            "UTC".to_string(),
            String::new(),
            0,
            "org".to_string(),
            &EventLimits::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn publish_is_idempotent() {
        let mut event = test_event(10);
        assert!(event.publish());
        assert!(!event.publish());
        assert!(event.is_published());
    }

    #[test]
    fn unpublish_is_idempotent() {
        let mut event = test_event(10);
        event.publish();
        assert!(event.unpublish());
        assert!(!event.unpublish());
    }

    #[test]
    fn unpublished_event_rejects_registration() {
        let event = test_event(10);
        let err = event
            .ensure_accepts_registrations(&Timestamp::now())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EventNotPublished);
    }

    #[test]
    fn started_event_rejects_registration() {
        let mut event = test_event(10);
        event.publish();
        let after_start = event.start_utc().plus_secs(1);
        let err = event.ensure_accepts_registrations(&after_start).unwrap_err();
        assert_eq!(err.code, ErrorCode::EventAlreadyStarted);
    }

    #[test]
    fn published_upcoming_event_accepts_registration() {
        let mut event = test_event(10);
        event.publish();
        assert!(event.ensure_accepts_registrations(&Timestamp::now()).is_ok());
    }

    #[test]
    fn capacity_increase_reports_additional() {
        let mut event = test_event(5);
        let change = event
            .update(
                EventPatch {
                    capacity: Some(8),
                    ..Default::default()
                },
                &EventLimits::default(),
            )
            .unwrap();
        assert_eq!(change, CapacityChange::Increased { additional: 3 });
        assert_eq!(event.capacity(), 8);
    }

    #[test]
    fn capacity_decrease_is_allowed() {
        let mut event = test_event(5);
        let change = event
            .update(
                EventPatch {
                    capacity: Some(2),
                    ..Default::default()
                },
                &EventLimits::default(),
            )
            .unwrap();
        assert_eq!(change, CapacityChange::Decreased);
        assert_eq!(event.capacity(), 2);
    }

    #[test]
    fn update_rejects_inverted_schedule() {
        let mut event = test_event(5);
        let result = event.update(
            EventPatch {
                end_utc: Some(event.start_utc().minus_secs(1)),
                ..Default::default()
            },
            &EventLimits::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn organizer_check_matches_subject() {
        let event = test_event(5);
        assert!(event.is_organizer("organizer-1"));
        assert!(!event.is_organizer("someone-else"));
    }
}

//! Request/response DTOs for the events surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;
use crate::domain::live_event::{EventPatch, LiveEvent};
use crate::domain::registration::{Registration, RegistrationStatus};
use crate::ports::WaitlistRow;

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub timezone: String,
    #[serde(default)]
    pub location: String,
    pub capacity: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_utc: Option<DateTime<Utc>>,
    pub end_utc: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    pub is_waitlist_open: Option<bool>,
}

impl From<UpdateEventRequest> for EventPatch {
    fn from(req: UpdateEventRequest) -> Self {
        EventPatch {
            name: req.name,
            description: req.description,
            start_utc: req.start_utc.map(Timestamp::from_datetime),
            end_utc: req.end_utc.map(Timestamp::from_datetime),
            timezone: req.timezone,
            location: req.location,
            capacity: req.capacity,
            is_waitlist_open: req.is_waitlist_open,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListEventsParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub notes: Option<String>,
    /// Client nonce for duplicate-submission protection.
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListRegistrationsParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub status: Option<RegistrationStatus>,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
    pub timezone: String,
    pub location: String,
    pub capacity: i32,
    pub organizer_id: String,
    pub is_published: bool,
    pub is_waitlist_open: bool,
}

impl From<&LiveEvent> for EventResponse {
    fn from(event: &LiveEvent) -> Self {
        Self {
            id: event.id().to_string(),
            name: event.name().to_string(),
            description: event.description().to_string(),
            start_utc: *event.start_utc().as_datetime(),
            end_utc: *event.end_utc().as_datetime(),
            timezone: event.timezone().to_string(),
            location: event.location().to_string(),
            capacity: event.capacity(),
            organizer_id: event.organizer_id().to_string(),
            is_published: event.is_published(),
            is_waitlist_open: event.is_waitlist_open(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventListResponse {
    pub items: Vec<EventResponse>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Serialize)]
pub struct UpdateEventResponse {
    #[serde(flatten)]
    pub event: EventResponse,
    /// Warning flag: capacity now sits below the confirmed count.
    pub capacity_below_confirmed: bool,
}

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub status: RegistrationStatus,
    pub position_in_queue: Option<i32>,
    pub registered_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl From<&Registration> for RegistrationResponse {
    fn from(registration: &Registration) -> Self {
        Self {
            id: registration.id().to_string(),
            event_id: registration.live_event_id().to_string(),
            user_id: registration.user_id().to_string(),
            status: registration.status(),
            position_in_queue: registration.position_in_queue(),
            registered_at: *registration.registered_at().as_datetime(),
            notes: registration.notes().map(String::from),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegistrationListResponse {
    pub items: Vec<RegistrationResponse>,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct WaitlistRowResponse {
    pub registration_id: String,
    pub user_id: String,
    pub position: i32,
    pub registered_at: DateTime<Utc>,
}

impl From<&WaitlistRow> for WaitlistRowResponse {
    fn from(row: &WaitlistRow) -> Self {
        Self {
            registration_id: row.registration_id.to_string(),
            user_id: row.user_id.to_string(),
            position: row.position,
            registered_at: *row.registered_at.as_datetime(),
        }
    }
}

//! HTTP handlers for the events surface.
//!
//! Thin adapters: parse, build the command, call the application handler,
//! wrap the result in the envelope.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::adapters::http::envelope::{error_response, ApiResponse};
use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::live_event::{
    CreateEventCommand, CreateEventHandler, DeleteEventCommand, DeleteEventHandler,
    GetEventHandler, GetEventQuery, ListEventsHandler, ListEventsQuery, PublishEventCommand,
    PublishEventHandler, UpdateEventCommand, UpdateEventHandler,
};
use crate::application::handlers::registration::{
    CancelRegistrationCommand, CancelRegistrationHandler, ConfirmRegistrationCommand,
    ConfirmRegistrationHandler, GetWaitlistHandler, GetWaitlistQuery, ListRegistrationsHandler,
    ListRegistrationsQuery, RegisterCommand, RegisterHandler,
};
use crate::domain::foundation::{CommandMetadata, LiveEventId, RegistrationId, Requester, Timestamp};
use crate::ports::{LiveEventFilter, Page};

use super::dto::{
    CreateEventRequest, EventListResponse, EventResponse, ListEventsParams,
    ListRegistrationsParams, RegisterRequest, RegistrationListResponse, RegistrationResponse,
    UpdateEventRequest, UpdateEventResponse, WaitlistRowResponse,
};

/// Application handlers behind the events surface.
#[derive(Clone)]
pub struct EventHandlers {
    pub create: Arc<CreateEventHandler>,
    pub update: Arc<UpdateEventHandler>,
    pub publish: Arc<PublishEventHandler>,
    pub delete: Arc<DeleteEventHandler>,
    pub get: Arc<GetEventHandler>,
    pub list: Arc<ListEventsHandler>,
    pub register: Arc<RegisterHandler>,
    pub cancel: Arc<CancelRegistrationHandler>,
    pub confirm: Arc<ConfirmRegistrationHandler>,
    pub list_registrations: Arc<ListRegistrationsHandler>,
    pub waitlist: Arc<GetWaitlistHandler>,
}

fn metadata_for(requester: Requester) -> CommandMetadata {
    CommandMetadata::new(requester)
        .with_correlation_id(uuid::Uuid::new_v4().to_string())
        .with_source("api")
}

fn parse_event_id(raw: &str) -> Result<LiveEventId, Response> {
    raw.parse::<LiveEventId>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()> {
                success: false,
                message: Some("Invalid event id".to_string()),
                data: None,
                errors: None,
            }),
        )
            .into_response()
    })
}

fn parse_registration_id(raw: &str) -> Result<RegistrationId, Response> {
    raw.parse::<RegistrationId>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()> {
                success: false,
                message: Some("Invalid registration id".to_string()),
                data: None,
                errors: None,
            }),
        )
            .into_response()
    })
}

/// GET /api/events - public listing of published upcoming events.
pub async fn list_events(
    State(handlers): State<EventHandlers>,
    Query(params): Query<ListEventsParams>,
) -> Response {
    let query = ListEventsQuery {
        filter: LiveEventFilter {
            published_only: true,
            upcoming_only: true,
            organizer_id: None,
        },
        page: Page::from_number(params.page, params.per_page),
    };

    match handlers.list.handle(query).await {
        Ok(page) => {
            let response = EventListResponse {
                items: page.items.iter().map(EventResponse::from).collect(),
                total: page.total,
                page: params.page,
                per_page: params.per_page,
            };
            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET /api/events/:id - public event read.
pub async fn get_event(
    State(handlers): State<EventHandlers>,
    Path(event_id): Path<String>,
) -> Response {
    let live_event_id = match parse_event_id(&event_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers.get.handle(GetEventQuery { live_event_id }).await {
        Ok(Some(event)) => {
            (StatusCode::OK, Json(ApiResponse::ok(EventResponse::from(&event)))).into_response()
        }
        Ok(None) => error_response(crate::domain::foundation::DomainError::event_not_found(
            live_event_id,
        )),
        Err(e) => error_response(e),
    }
}

/// POST /api/events - create (admin).
pub async fn create_event(
    State(handlers): State<EventHandlers>,
    RequireAuth(requester): RequireAuth,
    Json(req): Json<CreateEventRequest>,
) -> Response {
    let cmd = CreateEventCommand {
        name: req.name,
        description: req.description,
        start_utc: Timestamp::from_datetime(req.start_utc),
        end_utc: Timestamp::from_datetime(req.end_utc),
        timezone: req.timezone,
        location: req.location,
        capacity: req.capacity,
    };

    match handlers.create.handle(cmd, metadata_for(requester)).await {
        Ok(event) => (
            StatusCode::OK,
            Json(ApiResponse::ok_with_message(
                EventResponse::from(&event),
                "Event created",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// PUT /api/events/:id - update (admin).
pub async fn update_event(
    State(handlers): State<EventHandlers>,
    RequireAuth(requester): RequireAuth,
    Path(event_id): Path<String>,
    Json(req): Json<UpdateEventRequest>,
) -> Response {
    let live_event_id = match parse_event_id(&event_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = UpdateEventCommand {
        live_event_id,
        patch: req.into(),
    };

    match handlers.update.handle(cmd, metadata_for(requester)).await {
        Ok(result) => {
            let response = UpdateEventResponse {
                event: EventResponse::from(&result.event),
                capacity_below_confirmed: result.capacity_below_confirmed,
            };
            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// DELETE /api/events/:id - delete when empty (admin).
pub async fn delete_event(
    State(handlers): State<EventHandlers>,
    RequireAuth(requester): RequireAuth,
    Path(event_id): Path<String>,
) -> Response {
    let live_event_id = match parse_event_id(&event_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers
        .delete
        .handle(DeleteEventCommand { live_event_id }, metadata_for(requester))
        .await
    {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::message("Event deleted"))).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/events/:id/publish and /unpublish (admin).
pub async fn set_published(
    State(handlers): State<EventHandlers>,
    RequireAuth(requester): RequireAuth,
    Path(event_id): Path<String>,
    publish: bool,
) -> Response {
    let live_event_id = match parse_event_id(&event_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = PublishEventCommand {
        live_event_id,
        publish,
    };
    match handlers.publish.handle(cmd, metadata_for(requester)).await {
        Ok(result) => {
            let message = match (publish, result.changed) {
                (true, true) => "Event published",
                (true, false) => "Event was already published",
                (false, true) => "Event unpublished",
                (false, false) => "Event was already unpublished",
            };
            (
                StatusCode::OK,
                Json(ApiResponse::ok_with_message(
                    EventResponse::from(&result.event),
                    message,
                )),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/events/:id/register - sign up (authenticated).
pub async fn register(
    State(handlers): State<EventHandlers>,
    RequireAuth(requester): RequireAuth,
    Path(event_id): Path<String>,
    Json(req): Json<RegisterRequest>,
) -> Response {
    let live_event_id = match parse_event_id(&event_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = RegisterCommand {
        live_event_id,
        notes: req.notes,
        idempotency_nonce: req.idempotency_key,
    };

    match handlers.register.handle(cmd, metadata_for(requester)).await {
        Ok(result) => {
            let message = if result.replayed {
                "Registration already recorded"
            } else {
                match result.registration.position_in_queue() {
                    Some(_) => "Event is full; you have been waitlisted",
                    None => "Registration confirmed",
                }
            };
            (
                StatusCode::OK,
                Json(ApiResponse::ok_with_message(
                    RegistrationResponse::from(&result.registration),
                    message,
                )),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET /api/events/:id/registrations - list (admin).
pub async fn list_registrations(
    State(handlers): State<EventHandlers>,
    RequireAuth(requester): RequireAuth,
    Path(event_id): Path<String>,
    Query(params): Query<ListRegistrationsParams>,
) -> Response {
    let live_event_id = match parse_event_id(&event_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let query = ListRegistrationsQuery {
        live_event_id,
        status: params.status,
        page: Page::from_number(params.page, params.per_page),
    };

    match handlers
        .list_registrations
        .handle(query, metadata_for(requester))
        .await
    {
        Ok(page) => {
            let response = RegistrationListResponse {
                items: page.items.iter().map(RegistrationResponse::from).collect(),
                total: page.total,
            };
            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// GET /api/events/:id/waitlist - waitlist with positions (admin).
pub async fn get_waitlist(
    State(handlers): State<EventHandlers>,
    RequireAuth(requester): RequireAuth,
    Path(event_id): Path<String>,
) -> Response {
    let live_event_id = match parse_event_id(&event_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers
        .waitlist
        .handle(GetWaitlistQuery { live_event_id }, metadata_for(requester))
        .await
    {
        Ok(rows) => {
            let response: Vec<WaitlistRowResponse> =
                rows.iter().map(WaitlistRowResponse::from).collect();
            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/events/:id/registrations/:rid/confirm - promote (admin).
pub async fn confirm_registration(
    State(handlers): State<EventHandlers>,
    RequireAuth(requester): RequireAuth,
    Path((event_id, registration_id)): Path<(String, String)>,
) -> Response {
    if let Err(response) = parse_event_id(&event_id) {
        return response;
    }
    let registration_id = match parse_registration_id(&registration_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers
        .confirm
        .handle(
            ConfirmRegistrationCommand { registration_id },
            metadata_for(requester),
        )
        .await
    {
        Ok(registration) => (
            StatusCode::OK,
            Json(ApiResponse::ok_with_message(
                RegistrationResponse::from(&registration),
                "Registration confirmed",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/events/:id/registrations/:rid/cancel - cancel (owner/admin).
pub async fn cancel_registration(
    State(handlers): State<EventHandlers>,
    RequireAuth(requester): RequireAuth,
    Path((event_id, registration_id)): Path<(String, String)>,
) -> Response {
    if let Err(response) = parse_event_id(&event_id) {
        return response;
    }
    let registration_id = match parse_registration_id(&registration_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers
        .cancel
        .handle(
            CancelRegistrationCommand { registration_id },
            metadata_for(requester),
        )
        .await
    {
        Ok(registration) => (
            StatusCode::OK,
            Json(ApiResponse::ok_with_message(
                RegistrationResponse::from(&registration),
                "Registration cancelled",
            )),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

//! Routes for the events surface.

use axum::routing::{delete, get, post, put};
use axum::Router;

use super::handlers::{
    cancel_registration, confirm_registration, create_event, delete_event, get_event,
    get_waitlist, list_events, list_registrations, register, set_published, update_event,
    EventHandlers,
};

/// Builds the `/api/events` router.
pub fn event_routes(handlers: EventHandlers) -> Router {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route("/:id", get(get_event))
        .route("/:id", put(update_event))
        .route("/:id", delete(delete_event))
        .route(
            "/:id/publish",
            post(|state, auth, path| set_published(state, auth, path, true)),
        )
        .route(
            "/:id/unpublish",
            post(|state, auth, path| set_published(state, auth, path, false)),
        )
        .route("/:id/register", post(register))
        .route("/:id/registrations", get(list_registrations))
        .route("/:id/waitlist", get(get_waitlist))
        .route(
            "/:id/registrations/:rid/confirm",
            post(confirm_registration),
        )
        .route("/:id/registrations/:rid/cancel", post(cancel_registration))
        .with_state(handlers)
}

//! Routes for the users surface.

use axum::routing::{delete, get};
use axum::Router;

use super::handlers::{erase_user, export_user, UserHandlers};

/// Builds the `/api/users` router.
pub fn user_routes(handlers: UserHandlers) -> Router {
    Router::new()
        .route("/:id/export", get(export_user))
        .route("/:id", delete(erase_user))
        .with_state(handlers)
}

//! HTTP handlers for the users surface (DSAR export and erasure).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::adapters::http::envelope::{error_response, ApiResponse};
use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::user::{
    EraseUserCommand, EraseUserHandler, ExportUserHandler, ExportUserQuery, UserExport,
};
use crate::domain::foundation::{CommandMetadata, Requester, UserId};

/// Application handlers behind the users surface.
#[derive(Clone)]
pub struct UserHandlers {
    pub export: Arc<ExportUserHandler>,
    pub erase: Arc<EraseUserHandler>,
}

fn metadata_for(requester: Requester) -> CommandMetadata {
    CommandMetadata::new(requester)
        .with_correlation_id(uuid::Uuid::new_v4().to_string())
        .with_source("api")
}

fn parse_user_id(raw: &str) -> Result<UserId, Response> {
    raw.parse::<UserId>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()> {
                success: false,
                message: Some("Invalid user id".to_string()),
                data: None,
                errors: None,
            }),
        )
            .into_response()
    })
}

/// GET /api/users/:id/export - DSAR JSON (self or admin).
pub async fn export_user(
    State(handlers): State<UserHandlers>,
    RequireAuth(requester): RequireAuth,
    Path(user_id): Path<String>,
) -> Response {
    let user_id = match parse_user_id(&user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers
        .export
        .handle(ExportUserQuery { user_id }, metadata_for(requester))
        .await
    {
        Ok(export) => {
            (StatusCode::OK, Json(ApiResponse::<UserExport>::ok(export))).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// DELETE /api/users/:id - erase/anonymize (admin).
pub async fn erase_user(
    State(handlers): State<UserHandlers>,
    RequireAuth(requester): RequireAuth,
    Path(user_id): Path<String>,
) -> Response {
    let user_id = match parse_user_id(&user_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers
        .erase
        .handle(EraseUserCommand { user_id }, metadata_for(requester))
        .await
    {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::message("User erased"))).into_response(),
        Err(e) => error_response(e),
    }
}

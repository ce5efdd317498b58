//! Response envelope shared by every endpoint:
//! `{ success, message?, data?, errors? }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::domain::foundation::{DomainError, ErrorKind};

/// The wire envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            errors: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            errors: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            errors: None,
        }
    }

    fn failure(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            errors: if errors.is_empty() { None } else { Some(errors) },
        }
    }
}

/// Maps a domain error to status code + failure envelope.
pub fn error_response(err: DomainError) -> Response {
    let status = match err.kind() {
        ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Transient | ErrorKind::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(code = %err.code, error = %err, "request failed");
    }

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        // Internal detail stays in the logs.
        "Internal server error".to_string()
    } else {
        err.message.clone()
    };

    let mut errors: Vec<String> = err
        .details
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect();
    errors.sort();

    (status, Json(ApiResponse::failure(message, errors))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    #[test]
    fn ok_envelope_has_data() {
        let envelope = ApiResponse::ok(42);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 42);
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn failure_envelope_carries_errors() {
        let envelope = ApiResponse::failure("bad", vec!["field: name".to_string()]);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"][0], "field: name");
    }

    #[test]
    fn status_mapping_follows_error_kind() {
        let not_found = error_response(DomainError::new(ErrorCode::EventNotFound, "x"));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let conflict = error_response(DomainError::new(ErrorCode::DuplicateRegistration, "x"));
        assert_eq!(conflict.status(), StatusCode::BAD_REQUEST);

        let forbidden = error_response(DomainError::new(ErrorCode::Forbidden, "x"));
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let fatal = error_response(DomainError::new(ErrorCode::InternalError, "boom"));
        assert_eq!(fatal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

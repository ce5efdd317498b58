//! JWT auth extractor.
//!
//! Validates `Authorization: Bearer <jwt>` against the configured HS256
//! secret and exposes the caller as a `Requester`. The admin role is the
//! literal `"Admin"` entry in the token's `roles` claim. Token issuance is
//! the identity provider's business; this adapter only verifies.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::adapters::http::envelope::ApiResponse;
use crate::domain::foundation::Requester;

/// JWT claims this service reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// External identity subject.
    pub sub: String,
    /// Role names; `"Admin"` grants the admin role.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Expiry (seconds since epoch); validated by jsonwebtoken.
    pub exp: u64,
}

/// Shared verifier handed to the router as an extension.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Requester, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(token, &self.key, &Validation::default())?;
        let is_admin = data.claims.roles.iter().any(|r| r == "Admin");
        Ok(Requester {
            subject: data.claims.sub,
            is_admin,
        })
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::<()> {
            success: false,
            message: Some(message.to_string()),
            data: None,
            errors: None,
        }),
    )
        .into_response()
}

/// Extractor requiring a valid bearer token.
pub struct RequireAuth(pub Requester);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequireAuth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let verifier = parts
            .extensions
            .get::<JwtVerifier>()
            .cloned()
            .ok_or_else(|| unauthorized("Authentication is not configured"))?;

        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Authorization header must be a bearer token"))?;

        let requester = verifier
            .verify(token)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        Ok(RequireAuth(requester))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, roles: Vec<&str>) -> String {
        let claims = Claims {
            sub: "subject-1".to_string(),
            roles: roles.into_iter().map(String::from).collect(),
            exp: (chrono::Utc::now().timestamp() + 3600) as u64,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn valid_token_resolves_requester() {
        let verifier = JwtVerifier::new("secret");
        let requester = verifier.verify(&token("secret", vec![])).unwrap();
        assert_eq!(requester.subject, "subject-1");
        assert!(!requester.is_admin);
    }

    #[test]
    fn admin_role_is_recognized() {
        let verifier = JwtVerifier::new("secret");
        let requester = verifier
            .verify(&token("secret", vec!["Admin", "User"]))
            .unwrap();
        assert!(requester.is_admin);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let verifier = JwtVerifier::new("secret");
        assert!(verifier.verify(&token("other", vec![])).is_err());
    }
}

//! Authentication configuration (JWT verification).

use serde::Deserialize;

use super::error::ValidationError;
use super::Environment;

/// JWT verification settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 shared secret used to verify bearer tokens.
    pub jwt_secret: String,
}

impl AuthConfig {
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.jwt_secret.is_empty() {
            return Err(ValidationError::new("auth.jwt_secret", "must be set"));
        }
        if *environment == Environment::Production && self.jwt_secret.len() < 32 {
            return Err(ValidationError::new(
                "auth.jwt_secret",
                "must be at least 32 bytes in production",
            ));
        }
        Ok(())
    }
}

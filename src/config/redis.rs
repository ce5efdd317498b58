//! Redis configuration (cache, idempotency, queue transport, pub/sub).

use serde::Deserialize;

use super::error::ValidationError;

/// Redis connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

impl RedisConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ValidationError::new(
                "redis.url",
                "must start with redis:// or rediss://",
            ));
        }
        Ok(())
    }
}

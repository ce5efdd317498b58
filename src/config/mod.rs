//! Application configuration.
//!
//! Type-safe loading from environment variables via the `config` and
//! `dotenvy` crates. Variables use the `GATHERLY` prefix with `__` as the
//! nesting separator: `GATHERLY__DATABASE__URL`, `GATHERLY__OUTBOX__MAX_TRIES`.
//!
//! # Example
//!
//! ```no_run
//! use gatherly::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod cache;
mod database;
mod error;
mod idempotency;
mod limits;
mod outbox;
mod pii;
mod queue;
mod redis;
mod server;

pub use auth::AuthConfig;
pub use cache::CacheConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use idempotency::IdempotencyConfig;
pub use limits::LimitsConfig;
pub use outbox::OutboxConfig;
pub use pii::PiiConfig;
pub use queue::{QueueConfig, QueueKind};
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    pub redis: RedisConfig,

    pub auth: AuthConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub idempotency: IdempotencyConfig,

    #[serde(default)]
    pub outbox: OutboxConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub pii: PiiConfig,
}

impl AppConfig {
    /// Load configuration from environment variables (and `.env` in dev).
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("GATHERLY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic validation of all sections.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.redis.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.limits.validate()?;
        self.idempotency.validate()?;
        self.outbox.validate()?;
        self.cache.validate()?;
        self.queue.validate()?;
        self.pii.validate()?;
        Ok(())
    }
}

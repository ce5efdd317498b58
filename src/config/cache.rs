//! Cache TTL configuration.

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// TTLs for the read-through cache.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_event_ttl_secs")]
    pub event_ttl_secs: u64,

    #[serde(default = "default_user_ttl_secs")]
    pub user_ttl_secs: u64,

    #[serde(default = "default_list_ttl_secs")]
    pub list_ttl_secs: u64,
}

fn default_event_ttl_secs() -> u64 {
    300
}

fn default_user_ttl_secs() -> u64 {
    600
}

fn default_list_ttl_secs() -> u64 {
    120
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            event_ttl_secs: default_event_ttl_secs(),
            user_ttl_secs: default_user_ttl_secs(),
            list_ttl_secs: default_list_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.event_ttl_secs == 0 || self.user_ttl_secs == 0 || self.list_ttl_secs == 0 {
            return Err(ValidationError::new("cache", "TTLs must be positive"));
        }
        Ok(())
    }

    pub fn event_ttl(&self) -> Duration {
        Duration::from_secs(self.event_ttl_secs)
    }

    pub fn user_ttl(&self) -> Duration {
        Duration::from_secs(self.user_ttl_secs)
    }

    pub fn list_ttl(&self) -> Duration {
        Duration::from_secs(self.list_ttl_secs)
    }
}

//! Outbox worker configuration.

use serde::Deserialize;
use std::time::Duration;

use crate::adapters::events::QueueWorkerConfig;

use super::error::ValidationError;

/// Queue worker tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct OutboxConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_max_tries")]
    pub max_tries: i32,

    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Claims older than this are released by the stuck sweep.
    #[serde(default = "default_claim_timeout_secs")]
    pub claim_timeout_secs: u64,

    /// Processed-row retention before TTL cleanup.
    #[serde(default = "default_retention_hours")]
    pub retention_hours: u64,
}

fn default_batch_size() -> u32 {
    50
}

fn default_max_tries() -> i32 {
    5
}

fn default_base_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    60_000
}

fn default_poll_interval_ms() -> u64 {
    200
}

fn default_claim_timeout_secs() -> u64 {
    120
}

fn default_retention_hours() -> u64 {
    24
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_tries: default_max_tries(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            claim_timeout_secs: default_claim_timeout_secs(),
            retention_hours: default_retention_hours(),
        }
    }
}

impl OutboxConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batch_size == 0 {
            return Err(ValidationError::new("outbox.batch_size", "must be positive"));
        }
        if self.max_tries < 1 {
            return Err(ValidationError::new("outbox.max_tries", "must be >= 1"));
        }
        if self.max_backoff_ms < self.base_backoff_ms {
            return Err(ValidationError::new(
                "outbox.max_backoff_ms",
                "must be >= base_backoff_ms",
            ));
        }
        Ok(())
    }

    pub fn to_worker_config(&self, worker_id: String) -> QueueWorkerConfig {
        QueueWorkerConfig {
            worker_id,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            batch_size: self.batch_size,
            max_tries: self.max_tries,
            base_backoff: Duration::from_millis(self.base_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            claim_timeout: Duration::from_secs(self.claim_timeout_secs),
            retention: Duration::from_secs(self.retention_hours * 3600),
            maintenance_every: 50,
        }
    }
}

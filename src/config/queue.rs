//! Queue transport configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// Which transport carries outbox payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueKind {
    /// No external queue; single-node dispatch only.
    InMemory,
    /// Redis list transport for cross-instance fan-out.
    External,
}

/// Queue transport settings.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_kind")]
    pub kind: QueueKind,

    #[serde(default = "default_queue_name")]
    pub name: String,

    #[serde(default = "default_dead_letter_name")]
    pub dead_letter_name: String,
}

fn default_kind() -> QueueKind {
    QueueKind::InMemory
}

fn default_queue_name() -> String {
    "gatherly:events".to_string()
}

fn default_dead_letter_name() -> String {
    "gatherly:events:dlq".to_string()
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            name: default_queue_name(),
            dead_letter_name: default_dead_letter_name(),
        }
    }
}

impl QueueConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.kind == QueueKind::External
            && (self.name.is_empty() || self.dead_letter_name.is_empty())
        {
            return Err(ValidationError::new(
                "queue.name",
                "queue and dead-letter names must be set for the external queue",
            ));
        }
        Ok(())
    }
}

//! Field-length and capacity limits.

use serde::Deserialize;

use crate::domain::live_event::EventLimits;

use super::error::ValidationError;

/// Validation limits applied to event attributes.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_capacity_max")]
    pub capacity_max: i32,

    #[serde(default = "default_title_max")]
    pub title_max: usize,

    #[serde(default = "default_description_max")]
    pub description_max: usize,

    #[serde(default = "default_location_max")]
    pub location_max: usize,
}

fn default_capacity_max() -> i32 {
    10_000
}

fn default_title_max() -> usize {
    200
}

fn default_description_max() -> usize {
    4_000
}

fn default_location_max() -> usize {
    500
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            capacity_max: default_capacity_max(),
            title_max: default_title_max(),
            description_max: default_description_max(),
            location_max: default_location_max(),
        }
    }
}

impl LimitsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.capacity_max < 1 {
            return Err(ValidationError::new("limits.capacity_max", "must be >= 1"));
        }
        if self.title_max == 0 {
            return Err(ValidationError::new("limits.title_max", "must be positive"));
        }
        Ok(())
    }

    pub fn to_event_limits(&self) -> EventLimits {
        EventLimits {
            capacity_max: self.capacity_max,
            title_max: self.title_max,
            description_max: self.description_max,
            location_max: self.location_max,
        }
    }
}

//! Registration lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Lifecycle status of a registration.
///
/// The wire mapping to small integers is fixed and part of the persisted
/// contract: Pending=0, Confirmed=1, Waitlisted=2, Cancelled=3, Attended=4,
/// NoShow=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Pending,
    Confirmed,
    Waitlisted,
    Cancelled,
    Attended,
    NoShow,
}

impl RegistrationStatus {
    /// Returns the fixed wire integer for this status.
    pub fn as_i16(&self) -> i16 {
        match self {
            RegistrationStatus::Pending => 0,
            RegistrationStatus::Confirmed => 1,
            RegistrationStatus::Waitlisted => 2,
            RegistrationStatus::Cancelled => 3,
            RegistrationStatus::Attended => 4,
            RegistrationStatus::NoShow => 5,
        }
    }

    /// Parses the fixed wire integer.
    pub fn from_i16(value: i16) -> Result<Self, DomainError> {
        match value {
            0 => Ok(RegistrationStatus::Pending),
            1 => Ok(RegistrationStatus::Confirmed),
            2 => Ok(RegistrationStatus::Waitlisted),
            3 => Ok(RegistrationStatus::Cancelled),
            4 => Ok(RegistrationStatus::Attended),
            5 => Ok(RegistrationStatus::NoShow),
            other => Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid registration status: {}", other),
            )),
        }
    }

    /// A registration counts against the (event, user) uniqueness rule
    /// unless it has been cancelled.
    pub fn is_active(&self) -> bool {
        !matches!(self, RegistrationStatus::Cancelled)
    }

    /// Statuses an admin confirm may promote from.
    pub fn is_promotable(&self) -> bool {
        matches!(
            self,
            RegistrationStatus::Pending | RegistrationStatus::Waitlisted
        )
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Waitlisted => "waitlisted",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::Attended => "attended",
            RegistrationStatus::NoShow => "no_show",
        };
        write!(f, "{}", s)
    }
}

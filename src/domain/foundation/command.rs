//! Command infrastructure shared by all handlers.
//!
//! Handlers accept a single `CommandMetadata` instead of loose
//! correlation/requester parameters, so new context fields never change
//! handler signatures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated principal executing a command.
///
/// Carries the external identity subject (from the JWT) plus the resolved
/// role. Admin-only operations check `is_admin`; ownership checks compare
/// `subject` against the aggregate's organizer or the registration owner's
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    /// External identity subject (e.g., OIDC `sub`).
    pub subject: String,

    /// Whether the caller holds the Admin role.
    pub is_admin: bool,
}

impl Requester {
    /// Creates a non-admin requester.
    pub fn user(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            is_admin: false,
        }
    }

    /// Creates an admin requester.
    pub fn admin(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            is_admin: true,
        }
    }
}

/// Metadata context for command handlers.
///
/// Carries the requester plus tracing context through the command pipeline;
/// propagated onto emitted event envelopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// The principal executing this command.
    pub requester: Requester,

    /// Links related operations across a single user request.
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,

    /// Source of this command (e.g., "api", "worker").
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl CommandMetadata {
    /// Creates new command metadata for the given requester.
    pub fn new(requester: Requester) -> Self {
        Self {
            requester,
            correlation_id: None,
            source: None,
        }
    }

    /// Builder: Add correlation ID for request tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Builder: Add source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the correlation ID, generating one if not set.
    ///
    /// Every command gets a correlation ID for tracing even if the API layer
    /// didn't provide one.
    pub fn correlation_id(&self) -> String {
        self.correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }

    /// Returns the source if set.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

#[cfg(test)]
impl CommandMetadata {
    /// Test fixture: a plain authenticated user.
    pub fn test_user() -> Self {
        Self::new(Requester::user("subject-123")).with_correlation_id("test-correlation")
    }

    /// Test fixture: an admin.
    pub fn test_admin() -> Self {
        Self::new(Requester::admin("admin-123")).with_correlation_id("test-correlation")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_requester_is_not_admin() {
        let requester = Requester::user("sub-1");
        assert!(!requester.is_admin);
        assert_eq!(requester.subject, "sub-1");
    }

    #[test]
    fn admin_requester_is_admin() {
        assert!(Requester::admin("sub-2").is_admin);
    }

    #[test]
    fn correlation_id_returns_set_value() {
        let metadata = CommandMetadata::new(Requester::user("sub")).with_correlation_id("corr-1");
        assert_eq!(metadata.correlation_id(), "corr-1");
    }

    #[test]
    fn correlation_id_generates_if_missing() {
        let metadata = CommandMetadata::new(Requester::user("sub"));
        assert!(!metadata.correlation_id().is_empty());
    }

    #[test]
    fn serialization_skips_none_fields() {
        let metadata = CommandMetadata::new(Requester::user("sub"));
        let json = serde_json::to_string(&metadata).unwrap();
        assert!(!json.contains("correlation_id"));
        assert!(!json.contains("source"));
    }
}

//! User aggregate entity.
//!
//! Users are created by administrators (or on first login by an identity
//! adapter) and persist until erased. Erasure anonymizes PII and deactivates
//! the account; registration history is retained under the anonymized row.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, Timestamp, UserId};

/// User aggregate.
///
/// PII fields (`email`, names, `phone`) may be stored encrypted at rest;
/// encryption is an adapter concern and invisible to this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    identity_id: String,
    email: String,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    is_active: bool,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl User {
    /// Create a new active user.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` on empty identity or malformed email
    pub fn new(
        id: UserId,
        identity_id: String,
        email: String,
        first_name: String,
        last_name: String,
        phone: Option<String>,
    ) -> Result<Self, DomainError> {
        if identity_id.trim().is_empty() {
            return Err(DomainError::validation(
                "identity_id",
                "Identity cannot be empty",
            ));
        }
        Self::validate_email(&email)?;

        let now = Timestamp::now();
        Ok(Self {
            id,
            identity_id,
            email,
            first_name,
            last_name,
            phone,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitute a user from persistence (no validation, no events).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: UserId,
        identity_id: String,
        email: String,
        first_name: String,
        last_name: String,
        phone: Option<String>,
        is_active: bool,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            identity_id,
            email,
            first_name,
            last_name,
            phone,
            is_active,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn identity_id(&self) -> &str {
        &self.identity_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    /// Full display name for notification payloads.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Erase PII and deactivate (DSAR erasure).
    ///
    /// The row survives so registration history keeps a stable foreign key;
    /// the identity link is replaced with an unrecoverable marker.
    pub fn anonymize(&mut self) {
        self.identity_id = format!("erased:{}", self.id);
        self.email = format!("erased+{}@invalid.local", self.id);
        self.first_name = "Erased".to_string();
        self.last_name = "User".to_string();
        self.phone = None;
        self.is_active = false;
        self.updated_at = Timestamp::now();
    }

    fn validate_email(email: &str) -> Result<(), DomainError> {
        let trimmed = email.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("email", "Email cannot be empty"));
        }
        // One '@' with something on both sides; full validation is the
        // identity provider's job.
        let mut parts = trimmed.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();
        if local.is_empty() || domain.is_empty() || !domain.contains('.') {
            return Err(DomainError::validation(
                "email",
                "Email has invalid format",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User::new(
            UserId::new(),
            "subject-1".to_string(),
            "ada@example.com".to_string(),
            "Ada".to_string(),
            "Lovelace".to_string(),
            Some("+49 151 0000".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn new_user_is_active() {
        assert!(test_user().is_active());
    }

    #[test]
    fn new_user_rejects_empty_identity() {
        let result = User::new(
            UserId::new(),
            "".to_string(),
            "a@b.io".to_string(),
            String::new(),
            String::new(),
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn new_user_rejects_malformed_email() {
        for email in ["", "no-at-sign", "@nolocal.io", "nodomain@", "a@nodot"] {
            let result = User::new(
                UserId::new(),
                "sub".to_string(),
                email.to_string(),
                String::new(),
                String::new(),
                None,
            );
            assert!(result.is_err(), "accepted {:?}", email);
        }
    }

    #[test]
    fn display_name_joins_names() {
        assert_eq!(test_user().display_name(), "Ada Lovelace");
    }

    #[test]
    fn anonymize_strips_pii_and_deactivates() {
        let mut user = test_user();
        let id = *user.id();
        user.anonymize();

        assert!(!user.is_active());
        assert_eq!(user.first_name(), "Erased");
        assert!(user.phone().is_none());
        assert!(user.email().contains(&id.to_string()));
        assert!(user.identity_id().starts_with("erased:"));
    }
}

//! UserRepository port - persistence for user aggregates.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::user::User;

/// Port for persisting User aggregates.
///
/// Implementations handle PII encryption transparently: aggregates cross
/// this boundary in plaintext, rows at rest may be ciphertext.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user.
    async fn save(&self, user: &User) -> Result<(), DomainError>;

    /// Update an existing user (also used by DSAR erasure).
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if no row was updated
    async fn update(&self, user: &User) -> Result<(), DomainError>;

    /// Load a user by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Load a user by external identity subject.
    async fn find_by_identity(&self, identity_id: &str) -> Result<Option<User>, DomainError>;

    /// Load a user by email (matched via deterministic digest when rows are
    /// encrypted at rest).
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
}

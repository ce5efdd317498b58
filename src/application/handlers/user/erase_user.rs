//! EraseUserHandler - DSAR erasure: anonymize PII and deactivate.

use std::sync::Arc;

use tracing::info;

use crate::domain::foundation::{CommandMetadata, DomainError, ErrorCode, UserId};
use crate::ports::{user_key, CacheStore, UserRepository};

/// Command to erase a user.
#[derive(Debug, Clone)]
pub struct EraseUserCommand {
    pub user_id: UserId,
}

/// Handler for erasure. The row survives anonymized so registration history
/// keeps its foreign key; repeated erasure is harmless.
pub struct EraseUserHandler {
    users: Arc<dyn UserRepository>,
    cache: Arc<dyn CacheStore>,
}

impl EraseUserHandler {
    pub fn new(users: Arc<dyn UserRepository>, cache: Arc<dyn CacheStore>) -> Self {
        Self { users, cache }
    }

    pub async fn handle(
        &self,
        cmd: EraseUserCommand,
        metadata: CommandMetadata,
    ) -> Result<(), DomainError> {
        if !metadata.requester.is_admin {
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "Only admins may erase users",
            ));
        }

        let mut user = self
            .users
            .find_by_id(&cmd.user_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::UserNotFound,
                    format!("User not found: {}", cmd.user_id),
                )
            })?;

        user.anonymize();
        self.users.update(&user).await?;
        self.cache.invalidate(&user_key(cmd.user_id)).await?;

        info!(
            target: "audit",
            action = "user.erased",
            entity_type = "User",
            entity_id = %cmd.user_id,
            user_id = %metadata.requester.subject,
            "user erased"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::InMemoryCacheStore;
    use crate::adapters::memory::InMemoryStore;
    use crate::domain::user::User;
    use crate::ports::UserRepository as _;

    async fn seeded() -> (Arc<InMemoryStore>, User) {
        let store = Arc::new(InMemoryStore::new());
        let user = User::new(
            UserId::new(),
            "subject-123".to_string(),
            "ada@example.com".to_string(),
            "Ada".to_string(),
            "Lovelace".to_string(),
            Some("+49 151".to_string()),
        )
        .unwrap();
        store.save(&user).await.unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn erase_anonymizes_and_deactivates() {
        let (store, user) = seeded().await;
        let handler = EraseUserHandler::new(store.clone(), Arc::new(InMemoryCacheStore::new()));

        handler
            .handle(
                EraseUserCommand { user_id: *user.id() },
                CommandMetadata::test_admin(),
            )
            .await
            .unwrap();

        let erased = store.find_by_id(user.id()).await.unwrap().unwrap();
        assert!(!erased.is_active());
        assert_ne!(erased.email(), "ada@example.com");
        assert!(erased.phone().is_none());
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let (store, user) = seeded().await;
        let handler = EraseUserHandler::new(store.clone(), Arc::new(InMemoryCacheStore::new()));

        let err = handler
            .handle(
                EraseUserCommand { user_id: *user.id() },
                CommandMetadata::test_user(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }
}

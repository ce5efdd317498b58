//! In-memory UserRepository.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::user::User;
use crate::ports::UserRepository;

use super::state::InMemoryStore;

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn save(&self, user: &User) -> Result<(), DomainError> {
        self.inner
            .lock()
            .await
            .users
            .insert(*user.id(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), DomainError> {
        let mut state = self.inner.lock().await;
        if !state.users.contains_key(user.id()) {
            return Err(DomainError::new(
                crate::domain::foundation::ErrorCode::UserNotFound,
                format!("User not found: {}", user.id()),
            ));
        }
        state.users.insert(*user.id(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        Ok(self.inner.lock().await.users.get(id).cloned())
    }

    async fn find_by_identity(&self, identity_id: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .inner
            .lock()
            .await
            .users
            .values()
            .find(|u| u.identity_id() == identity_id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        Ok(self
            .inner
            .lock()
            .await
            .users
            .values()
            .find(|u| u.email() == email)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(identity: &str, email: &str) -> User {
        User::new(
            UserId::new(),
            identity.to_string(),
            email.to_string(),
            "Ada".to_string(),
            "Lovelace".to_string(),
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn find_by_identity_and_email() {
        let store = InMemoryStore::new();
        let u = user("sub-1", "ada@example.com");
        store.save(&u).await.unwrap();

        assert!(store.find_by_identity("sub-1").await.unwrap().is_some());
        assert!(store
            .find_by_email("ada@example.com")
            .await
            .unwrap()
            .is_some());
        assert!(store.find_by_identity("sub-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_missing_user_fails() {
        let store = InMemoryStore::new();
        let err = store
            .update(&user("sub-x", "x@example.com"))
            .await
            .unwrap_err();
        assert_eq!(
            err.code,
            crate::domain::foundation::ErrorCode::UserNotFound
        );
    }
}

//! Read-through caching decorator for the user repository.
//!
//! Caches `user:<id>` lookups (the notifier's hot path) with the configured
//! TTL and invalidates on every write. Identity/email lookups pass through:
//! they key on mutable attributes and are not hot enough to justify the
//! invalidation bookkeeping.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::user::User;
use crate::ports::{user_key, CacheStore, UserRepository};

/// UserRepository decorator adding the `user:<id>` cache.
pub struct CachedUserRepository {
    inner: Arc<dyn UserRepository>,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl CachedUserRepository {
    pub fn new(inner: Arc<dyn UserRepository>, cache: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl UserRepository for CachedUserRepository {
    async fn save(&self, user: &User) -> Result<(), DomainError> {
        self.inner.save(user).await?;
        self.cache.invalidate(&user_key(user.id())).await
    }

    async fn update(&self, user: &User) -> Result<(), DomainError> {
        self.inner.update(user).await?;
        self.cache.invalidate(&user_key(user.id())).await
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let key = user_key(id);

        if let Some(cached) = self.cache.get(&key).await? {
            if let Ok(user) = serde_json::from_str::<User>(&cached) {
                return Ok(Some(user));
            }
            self.cache.invalidate(&key).await?;
        }

        let user = self.inner.find_by_id(id).await?;
        if let Some(user) = &user {
            if let Ok(json) = serde_json::to_string(user) {
                self.cache.set(&key, &json, self.ttl).await?;
            }
        }
        Ok(user)
    }

    async fn find_by_identity(&self, identity_id: &str) -> Result<Option<User>, DomainError> {
        self.inner.find_by_identity(identity_id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.inner.find_by_email(email).await
    }
}

//! CacheStore port - read-through JSON cache for hot lookups.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::foundation::DomainError;

/// Port for the read-through cache.
///
/// Values are JSON strings; (de)serialization stays with the caller so the
/// cache never learns domain types. The cache is an optimization only: a
/// cold cache must never produce a different answer than a warm one.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a cached value.
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Store a value with a TTL.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Drop one key (invalidate-on-write).
    async fn invalidate(&self, key: &str) -> Result<(), DomainError>;

    /// Drop every key with the given prefix (list pages after a write).
    async fn invalidate_prefix(&self, prefix: &str) -> Result<(), DomainError>;
}

/// Cache key for one event.
pub fn event_key(id: impl std::fmt::Display) -> String {
    format!("event:{}", id)
}

/// Cache key for one user.
pub fn user_key(id: impl std::fmt::Display) -> String {
    format!("user:{}", id)
}

/// Prefix under which all event list pages are cached.
pub const EVENT_LIST_PREFIX: &str = "events:list:";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(event_key("abc"), "event:abc");
        assert_eq!(user_key("u1"), "user:u1");
    }
}

//! In-memory idempotency store.
//!
//! Concurrent map with lazy reaping of expired entries. The map insert is
//! atomic under the lock, so the claim has the same no-race guarantee the
//! redis `SET NX` path has, within a single process.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::IdempotencyStore;

struct Claim {
    expires_at: Timestamp,
    result: Option<String>,
}

/// Map-backed idempotency adapter for single-node deployments.
#[derive(Default)]
pub struct InMemoryIdempotencyStore {
    claims: Mutex<HashMap<String, Claim>>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn try_claim(&self, key: &str, ttl: Duration) -> Result<bool, DomainError> {
        let now = Timestamp::now();
        let mut claims = self
            .claims
            .lock()
            .expect("InMemoryIdempotencyStore: lock poisoned");

        // Lazy reap while we hold the lock anyway.
        claims.retain(|_, c| c.expires_at.is_after(&now));

        if claims.contains_key(key) {
            return Ok(false);
        }
        claims.insert(
            key.to_string(),
            Claim {
                expires_at: now.plus_secs(ttl.as_secs()),
                result: None,
            },
        );
        Ok(true)
    }

    async fn remember(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let mut claims = self
            .claims
            .lock()
            .expect("InMemoryIdempotencyStore: lock poisoned");
        let expires_at = Timestamp::now().plus_secs(ttl.as_secs());
        claims
            .entry(key.to_string())
            .and_modify(|c| c.result = Some(value.to_string()))
            .or_insert(Claim {
                expires_at,
                result: Some(value.to_string()),
            });
        Ok(())
    }

    async fn recall(&self, key: &str) -> Result<Option<String>, DomainError> {
        let now = Timestamp::now();
        let claims = self
            .claims
            .lock()
            .expect("InMemoryIdempotencyStore: lock poisoned");
        Ok(claims
            .get(key)
            .filter(|c| c.expires_at.is_after(&now))
            .and_then(|c| c.result.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_claim_wins_second_loses() {
        let store = InMemoryIdempotencyStore::new();
        assert!(store
            .try_claim("register:e:u:n", Duration::from_secs(600))
            .await
            .unwrap());
        assert!(!store
            .try_claim("register:e:u:n", Duration::from_secs(600))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn expired_claim_can_be_retaken() {
        let store = InMemoryIdempotencyStore::new();
        assert!(store
            .try_claim("key", Duration::from_secs(0))
            .await
            .unwrap());
        assert!(store
            .try_claim("key", Duration::from_secs(60))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn remember_and_recall_round_trip() {
        let store = InMemoryIdempotencyStore::new();
        store
            .try_claim("key", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .remember("key", "reg-123", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            store.recall("key").await.unwrap().as_deref(),
            Some("reg-123")
        );
    }

    #[tokio::test]
    async fn recall_of_unclaimed_key_is_none() {
        let store = InMemoryIdempotencyStore::new();
        assert!(store.recall("missing").await.unwrap().is_none());
    }
}

//! In-memory cache store for single-node dev and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::CacheStore;

struct Entry {
    value: String,
    expires_at: Timestamp,
}

/// Map-backed cache with lazy expiry.
#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries (test observability).
    pub fn len(&self) -> usize {
        let now = Timestamp::now();
        self.entries
            .read()
            .expect("InMemoryCacheStore: lock poisoned")
            .values()
            .filter(|e| e.expires_at.is_after(&now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let now = Timestamp::now();
        {
            let entries = self
                .entries
                .read()
                .expect("InMemoryCacheStore: lock poisoned");
            match entries.get(key) {
                Some(entry) if entry.expires_at.is_after(&now) => {
                    return Ok(Some(entry.value.clone()))
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Expired: reap lazily.
        self.entries
            .write()
            .expect("InMemoryCacheStore: lock poisoned")
            .remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        self.entries
            .write()
            .expect("InMemoryCacheStore: lock poisoned")
            .insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at: Timestamp::now().plus_secs(ttl.as_secs()),
                },
            );
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), DomainError> {
        self.entries
            .write()
            .expect("InMemoryCacheStore: lock poisoned")
            .remove(key);
        Ok(())
    }

    async fn invalidate_prefix(&self, prefix: &str) -> Result<(), DomainError> {
        self.entries
            .write()
            .expect("InMemoryCacheStore: lock poisoned")
            .retain(|k, _| !k.starts_with(prefix));
        Ok(())
    }
}

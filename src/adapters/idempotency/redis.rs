//! Redis-backed idempotency store.
//!
//! Claims use `SET key NX EX`, which is atomic on the server: only one of
//! two racing claimants sees true.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::time::Duration;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::IdempotencyStore;

fn store_err(context: &str, e: redis::RedisError) -> DomainError {
    DomainError::new(ErrorCode::CacheError, format!("{}: {}", context, e))
}

/// Redis idempotency adapter.
///
/// The claim marker lives at `idem:<key>`; the remembered command result at
/// `idem:<key>:result` with the same TTL.
#[derive(Clone)]
pub struct RedisIdempotencyStore {
    conn: MultiplexedConnection,
}

impl RedisIdempotencyStore {
    pub fn new(conn: MultiplexedConnection) -> Self {
        Self { conn }
    }

    fn claim_key(key: &str) -> String {
        format!("idem:{}", key)
    }

    fn result_key(key: &str) -> String {
        format!("idem:{}:result", key)
    }
}

#[async_trait]
impl IdempotencyStore for RedisIdempotencyStore {
    async fn try_claim(&self, key: &str, ttl: Duration) -> Result<bool, DomainError> {
        let mut conn = self.conn.clone();
        let response: Option<String> = redis::cmd("SET")
            .arg(Self::claim_key(key))
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(|e| store_err("Idempotency claim failed", e))?;

        // SET NX returns OK when the key was set, nil when it existed.
        Ok(response.is_some())
    }

    async fn remember(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(Self::result_key(key))
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| store_err("Idempotency remember failed", e))
    }

    async fn recall(&self, key: &str) -> Result<Option<String>, DomainError> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(Self::result_key(key))
            .query_async(&mut conn)
            .await
            .map_err(|e| store_err("Idempotency recall failed", e))
    }
}

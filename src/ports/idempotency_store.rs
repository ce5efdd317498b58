//! IdempotencyStore port - claim keys guarding duplicate command execution.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::foundation::DomainError;

/// Port for idempotency claims.
///
/// Keys are supplied by adapters (e.g.
/// `register:<event_id>:<user_id>:<client-nonce>`) and are opaque here.
/// Implementations should claim with an atomic set-if-absent primitive
/// (`SET NX EX` on redis); without one there is an acknowledged small race
/// window between check and set.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Claim `key` for `ttl`. Returns true if this caller won the claim,
    /// false if the key is already held.
    async fn try_claim(&self, key: &str, ttl: Duration) -> Result<bool, DomainError>;

    /// Store the result of the command that claimed `key`, so replays can
    /// return the first outcome.
    async fn remember(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Fetch the remembered result for `key`, if any.
    async fn recall(&self, key: &str) -> Result<Option<String>, DomainError>;
}

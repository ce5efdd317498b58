//! Adapters - implementations of the ports against real infrastructure.
//!
//! - `postgres` - sqlx repositories, the transactional registration store,
//!   and the outbox table
//! - `events` - router/registry, queue worker, transports, idempotent
//!   handler decorator
//! - `cache` / `idempotency` - redis and in-memory backends
//! - `pii` - AES-GCM field cipher
//! - `memory` - single-node in-memory store for dev and tests
//! - `http` - axum surface

pub mod cache;
pub mod events;
pub mod http;
pub mod idempotency;
pub mod memory;
pub mod pii;
pub mod postgres;

//! Idempotency adapters: redis `SET NX EX` for production, concurrent map
//! for single-node deployments.

mod in_memory;
mod redis;

pub use in_memory::InMemoryIdempotencyStore;
pub use redis::RedisIdempotencyStore;

//! Cache adapters: redis for production, in-memory for dev/tests, plus the
//! read-through user-repository decorator.

mod cached_users;
mod in_memory;
mod redis;

pub use cached_users::CachedUserRepository;
pub use in_memory::InMemoryCacheStore;
pub use redis::RedisCacheStore;

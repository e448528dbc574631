//! Infrastructure and cross-cutting concerns
//!
//! - `cache`: key-value stores with expiry (Redis, in-process)
//! - `memo`: fail-open memoization of provider calls on top of a store

pub mod cache;
pub mod memo;

pub use cache::{CacheStore, MemoryStore, RedisStore};
pub use memo::{CacheStats, Memoizer};

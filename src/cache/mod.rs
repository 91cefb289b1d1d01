//! 缓存模块：带固定过期时间的查询结果缓存。
//!
//! # Result Caching Module
//!
//! A TTL cache for lookup results: weather lookups keyed by location, and
//! chat completions keyed by a hash of the request.
//!
//! ## Semantics
//!
//! - `get(key)` returns the value only while `now - stored_at < ttl`; an
//!   expired entry is evicted on read and reported as a miss.
//! - `set(key, value)` overwrites unconditionally and restarts the clock.
//! - No size bound and no LRU ordering.
//!
//! Time comes from `tokio::time::Instant`, so tests can pause and advance it.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheManager`] | Typed JSON cache with default TTL and statistics |
//! | [`CacheConfig`] | TTL, enabled flag, size limit, key prefix |
//! | [`CacheBackend`] | Trait for storage backends |
//! | [`MemoryCache`] | In-memory TTL backend |
//! | [`NullCache`] | No-op backend |
//! | [`CacheKey`] | Cache key; plain strings convert directly |
//! | [`CacheKeyGenerator`] | SHA-256 keys for chat requests |
//!
//! ## Example
//!
//! ```rust
//! use deepseek_kit::cache::{CacheConfig, CacheKey, CacheManager, MemoryCache};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> deepseek_kit::Result<()> {
//! let cache = CacheManager::new(
//!     CacheConfig::new().with_ttl(Duration::from_secs(600)),
//!     Box::new(MemoryCache::new()),
//! );
//! cache.set(&CacheKey::from("Berlin"), &"12°C, light rain").await?;
//! let hit: Option<String> = cache.get(&CacheKey::from("Berlin")).await?;
//! assert_eq!(hit.as_deref(), Some("12°C, light rain"));
//! # Ok(())
//! # }
//! ```

mod backend;
mod key;
mod manager;

pub use backend::{CacheBackend, MemoryCache, NullCache};
pub use key::{CacheKey, CacheKeyGenerator};
pub use manager::{CacheConfig, CacheManager, CacheStats};

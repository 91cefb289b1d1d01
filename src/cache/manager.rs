//! Cache manager.

use super::backend::CacheBackend;
use super::key::CacheKey;
use crate::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_ttl: Duration,
    pub enabled: bool,
    pub max_entry_size: usize,
    pub key_prefix: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            enabled: true,
            max_entry_size: 10 * 1024 * 1024,
            key_prefix: None,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Typed JSON cache over a [`CacheBackend`].
pub struct CacheManager {
    config: CacheConfig,
    backend: Box<dyn CacheBackend>,
    stats: AtomicStats,
}

impl CacheManager {
    pub fn new(config: CacheConfig, backend: Box<dyn CacheBackend>) -> Self {
        Self {
            config,
            backend,
            stats: AtomicStats::default(),
        }
    }

    /// In-memory cache with the given TTL.
    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(
            CacheConfig::new().with_ttl(ttl),
            Box::new(super::MemoryCache::new()),
        )
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        if !self.config.enabled {
            return Ok(None);
        }
        let prefixed = self.prefix_key(key);
        match self.backend.get(&prefixed).await {
            Ok(Some(data)) => match serde_json::from_slice(&data) {
                Ok(val) => {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    debug!(key = %prefixed, "cache hit");
                    Ok(Some(val))
                }
                Err(e) => {
                    // Undecodable entries behave as misses.
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    warn!(key = %prefixed, error = %e, "cache entry undecodable");
                    Ok(None)
                }
            },
            Ok(None) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = %prefixed, "cache miss");
                Ok(None)
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &CacheKey, value: &T) -> Result<()> {
        self.set_with_ttl(key, value, self.config.default_ttl).await
    }

    pub async fn set_with_ttl<T: Serialize>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }
        let data = serde_json::to_vec(value)?;
        if data.len() > self.config.max_entry_size {
            debug!(key = %key, size = data.len(), "entry too large, not cached");
            return Ok(());
        }
        let prefixed = self.prefix_key(key);
        match self.backend.set(&prefixed, &data, ttl).await {
            Ok(()) => {
                self.stats.sets.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    pub async fn delete(&self, key: &CacheKey) -> Result<bool> {
        if !self.config.enabled {
            return Ok(false);
        }
        let prefixed = self.prefix_key(key);
        match self.backend.delete(&prefixed).await {
            Ok(d) => {
                if d {
                    self.stats.deletes.fetch_add(1, Ordering::Relaxed);
                }
                Ok(d)
            }
            Err(e) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    pub async fn clear(&self) -> Result<()> {
        self.backend.clear().await
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn default_ttl(&self) -> Duration {
        self.config.default_ttl
    }

    fn prefix_key(&self, key: &CacheKey) -> CacheKey {
        if let Some(ref p) = self.config.key_prefix {
            CacheKey::new(format!("{}:{}", p, key.hash))
        } else {
            key.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCache, NullCache};

    #[tokio::test(start_paused = true)]
    async fn test_typed_roundtrip_and_stats() {
        let cache = CacheManager::in_memory(Duration::from_secs(30));
        let key = CacheKey::from("paris");

        assert_eq!(cache.get::<Vec<u32>>(&key).await.unwrap(), None);
        cache.set(&key, &vec![1u32, 2, 3]).await.unwrap();
        assert_eq!(cache.get::<Vec<u32>>(&key).await.unwrap(), Some(vec![1, 2, 3]));

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(cache.get::<Vec<u32>>(&key).await.unwrap(), None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.sets, 1);
        assert!((stats.hit_ratio() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_prefix_isolates_namespaces() {
        let backend = std::sync::Arc::new(MemoryCache::new());
        struct Shared(std::sync::Arc<MemoryCache>);
        #[async_trait::async_trait]
        impl CacheBackend for Shared {
            async fn get(&self, k: &CacheKey) -> Result<Option<Vec<u8>>> {
                self.0.get(k).await
            }
            async fn set(&self, k: &CacheKey, v: &[u8], t: Duration) -> Result<()> {
                self.0.set(k, v, t).await
            }
            async fn delete(&self, k: &CacheKey) -> Result<bool> {
                self.0.delete(k).await
            }
            async fn exists(&self, k: &CacheKey) -> Result<bool> {
                self.0.exists(k).await
            }
            async fn clear(&self) -> Result<()> {
                self.0.clear().await
            }
            async fn len(&self) -> Result<usize> {
                self.0.len().await
            }
            fn name(&self) -> &'static str {
                "shared"
            }
        }

        let weather = CacheManager::new(
            CacheConfig::new().with_key_prefix("weather"),
            Box::new(Shared(backend.clone())),
        );
        let chat = CacheManager::new(
            CacheConfig::new().with_key_prefix("chat"),
            Box::new(Shared(backend.clone())),
        );
        let key = CacheKey::from("same");
        weather.set(&key, &"sunny").await.unwrap();
        assert_eq!(chat.get::<String>(&key).await.unwrap(), None);
        assert_eq!(weather.get::<String>(&key).await.unwrap().as_deref(), Some("sunny"));
        assert_eq!(backend.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_is_inert() {
        let cache = CacheManager::new(
            CacheConfig::new().with_enabled(false),
            Box::new(NullCache::new()),
        );
        let key = CacheKey::from("k");
        cache.set(&key, &1).await.unwrap();
        assert_eq!(cache.get::<i32>(&key).await.unwrap(), None);
        assert_eq!(cache.stats(), CacheStats::default());
    }
}

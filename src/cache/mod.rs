//! Cache layer
//!
//! Public listings (events, gallery, MoUs, ticker) are read far more often
//! than they change, so they are held in an in-process moka cache. Keys are
//! prefixed with the table they were built from (`events:list`,
//! `gallery:highlights`, ...) and every write to a table drops that prefix.
//!
//! # Usage
//!
//! ```rust,ignore
//! use eitp::cache::{create_cache, CacheLayer};
//! use eitp::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set("events:list", &events).await?;
//! cache.delete_pattern("events:*").await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Cache layer trait
///
/// The methods are generic, so the trait is not object safe; share a concrete
/// `Arc<MemoryCache>` instead of a trait object.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Store a value for the cache-wide TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete every key matching a glob pattern (`*` and `?`)
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

/// Shared cache handle
pub type SharedCache = Arc<MemoryCache>;

/// Build the cache described by `config`
pub fn create_cache(config: &CacheConfig) -> SharedCache {
    let ttl = Duration::from_secs(config.ttl_seconds);
    Arc::new(MemoryCache::with_capacity_and_ttl(config.max_capacity, ttl))
}

/// Cache-aside read: return the cached value for `key`, or run `load`,
/// cache its result and return it.
///
/// A cache that fails to (de)serialize is treated as a miss. If anything was
/// invalidated while `load` ran, its result may predate that write and is
/// returned without being kept.
pub async fn get_or_load<T, F, Fut, E>(cache: &MemoryCache, key: &str, load: F) -> Result<T, E>
where
    T: Serialize + DeserializeOwned + Send + Sync,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    match cache.get::<T>(key).await {
        Ok(Some(hit)) => return Ok(hit),
        Ok(None) => {}
        Err(e) => tracing::warn!("Cache read failed for {}: {}", key, e),
    }

    let generation = cache.generation();
    let value = load().await?;
    if generation != cache.generation() {
        return Ok(value);
    }
    if let Err(e) = cache.set(key, &value).await {
        tracing::warn!("Cache write failed for {}: {}", key, e);
    } else if generation != cache.generation() {
        // Invalidated between the check and the write
        if let Err(e) = cache.delete(key).await {
            tracing::warn!("Cache delete failed for {}: {}", key, e);
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_create_cache_from_config() {
        let config = CacheConfig {
            ttl_seconds: 1800,
            max_capacity: 10,
        };
        let cache = create_cache(&config);
        assert_eq!(cache.default_ttl(), Duration::from_secs(1800));

        cache.set("key", &"value".to_string()).await.unwrap();
        let result: Option<String> = cache.get("key").await.unwrap();
        assert_eq!(result, Some("value".to_string()));
    }

    #[tokio::test]
    async fn test_get_or_load_hits_after_first_load() {
        let cache = create_cache(&CacheConfig::default());
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Vec<i64> = get_or_load(&cache, "events:list", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, anyhow::Error>(vec![1, 2, 3])
            })
            .await
            .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_load_drops_results_raced_by_invalidation() {
        let cache = create_cache(&CacheConfig::default());

        // A write lands while the listing is being loaded
        let stale: Vec<i64> = get_or_load(&cache, "events:list", || async {
            cache.delete_pattern("events:*").await.unwrap();
            Ok::<_, anyhow::Error>(vec![1])
        })
        .await
        .unwrap();
        assert_eq!(stale, vec![1]);
        assert!(cache.get::<Vec<i64>>("events:list").await.unwrap().is_none());

        let fresh: Vec<i64> = get_or_load(&cache, "events:list", || async {
            Ok::<_, anyhow::Error>(vec![1, 2])
        })
        .await
        .unwrap();
        assert_eq!(fresh, vec![1, 2]);
        assert_eq!(cache.get::<Vec<i64>>("events:list").await.unwrap(), Some(vec![1, 2]));
    }

    #[tokio::test]
    async fn test_get_or_load_does_not_cache_errors() {
        let cache = create_cache(&CacheConfig::default());

        let failed: Result<i64, String> =
            get_or_load(&cache, "mous:list", || async { Err("db down".to_string()) }).await;
        assert!(failed.is_err());

        let loaded: Result<i64, String> = get_or_load(&cache, "mous:list", || async { Ok(7) }).await;
        assert_eq!(loaded, Ok(7));
    }
}

//! In-memory cache implementation using moka
//!
//! Values are stored as JSON so one cache can hold any serializable listing.

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_MAX_CAPACITY: u64 = 1_000;

const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Clone)]
struct CacheEntry {
    data: Arc<String>,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T) -> Result<Self> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
        })
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data).context("Failed to deserialize cache value")
    }
}

/// In-memory cache using moka, with one TTL for every entry
pub struct MemoryCache {
    cache: Cache<String, CacheEntry>,
    default_ttl: Duration,
    /// Bumped before every invalidation
    generation: AtomicU64,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    pub fn with_capacity_and_ttl(max_capacity: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(default_ttl)
            .build();

        Self {
            cache,
            default_ttl,
            generation: AtomicU64::new(0),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Changes whenever something is deleted from the cache
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Glob match supporting `*` (any run) and `?` (one character)
    ///
    /// `events:*` matches `events:list` and `events:calendar:2024-03`.
    fn pattern_matches(pattern: &str, key: &str) -> bool {
        let pattern: Vec<char> = pattern.chars().collect();
        let key: Vec<char> = key.chars().collect();
        Self::glob_match(&pattern, &key)
    }

    fn glob_match(pattern: &[char], key: &[char]) -> bool {
        match pattern.split_first() {
            None => key.is_empty(),
            Some(('*', rest)) => {
                Self::glob_match(rest, key)
                    || (!key.is_empty() && Self::glob_match(pattern, &key[1..]))
            }
            Some(('?', rest)) => !key.is_empty() && Self::glob_match(rest, &key[1..]),
            Some((c, rest)) => key.first() == Some(c) && Self::glob_match(rest, &key[1..]),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheLayer for MemoryCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) => Ok(Some(entry.deserialize()?)),
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let entry = CacheEntry::new(value)?;
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.bump_generation();
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        self.bump_generation();
        let keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| Self::pattern_matches(pattern, key.as_ref()))
            .map(|(key, _)| (*key).clone())
            .collect();

        for key in keys {
            self.cache.invalidate(&key).await;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.bump_generation();
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = MemoryCache::new();
        cache.set("ticker:feed", &vec!["a".to_string()]).await.unwrap();

        let hit: Option<Vec<String>> = cache.get("ticker:feed").await.unwrap();
        assert_eq!(hit, Some(vec!["a".to_string()]));

        cache.delete("ticker:feed").await.unwrap();
        let miss: Option<Vec<String>> = cache.get("ticker:feed").await.unwrap();
        assert!(miss.is_none());
    }

    #[tokio::test]
    async fn test_delete_pattern_only_touches_prefix() {
        let cache = MemoryCache::new();
        cache.set("events:list", &1).await.unwrap();
        cache.set("events:calendar:2024-03", &2).await.unwrap();
        cache.set("gallery:list", &3).await.unwrap();

        cache.delete_pattern("events:*").await.unwrap();

        assert!(cache.get::<i32>("events:list").await.unwrap().is_none());
        assert!(cache.get::<i32>("events:calendar:2024-03").await.unwrap().is_none());
        assert_eq!(cache.get::<i32>("gallery:list").await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let cache = MemoryCache::with_capacity_and_ttl(100, Duration::from_millis(10));
        cache.set("mous:list", &"x").await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        cache.cache.run_pending_tasks().await;

        assert!(cache.get::<String>("mous:list").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = MemoryCache::new();
        cache.set("a", &1).await.unwrap();
        cache.set("b", &2).await.unwrap();
        cache.clear().await.unwrap();
        assert!(cache.get::<i32>("a").await.unwrap().is_none());
    }

    #[test]
    fn test_pattern_matches() {
        assert!(MemoryCache::pattern_matches("events:*", "events:list"));
        assert!(MemoryCache::pattern_matches("user:?:x", "user:1:x"));
        assert!(!MemoryCache::pattern_matches("events:*", "gallery:list"));
        assert!(!MemoryCache::pattern_matches("a?", "a"));
    }

    proptest! {
        #[test]
        fn prop_prefix_star_matches_any_suffix(prefix in "[a-z]{1,8}", suffix in "[a-z:0-9-]{0,16}") {
            let key = format!("{}:{}", prefix, suffix);
            let pattern = format!("{}:*", prefix);
            prop_assert!(MemoryCache::pattern_matches(&pattern, &key));
        }
    }
}

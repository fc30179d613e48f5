//! Short-lived result cache in front of the scrapers.
//!
//! Values are stored as serialized JSON so a cached list is returned
//! byte-for-byte as it was written. Anything that cannot be decoded is
//! treated as a miss.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Two hours
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(7200);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Arc<[u8]>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Concurrent TTL cache keyed by normalized query.
///
/// Construct one per process and hand it to the scrapers as
/// `Arc<ResultCache>`.
#[derive(Debug)]
pub struct ResultCache {
    entries: DashMap<String, CacheEntry>,
    default_ttl: Duration,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = Instant::now();

        // The shard guard must be released before a removal on the same key
        let lookup = self
            .entries
            .get(key)
            .map(|entry| (Arc::clone(&entry.value), entry.is_expired(now)));

        let bytes = match lookup {
            Some((bytes, false)) => bytes,
            Some((_, true)) => {
                self.entries.remove_if(key, |_, entry| entry.is_expired(now));
                debug!(key, "Cache entry expired");
                info!(key, "Cache miss");
                return None;
            }
            None => {
                info!(key, "Cache miss");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => {
                info!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(key, "Ignoring undecodable cache entry: {e}");
                None
            }
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key, "Not caching value that failed to serialize: {e}");
                return;
            }
        };

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: bytes.into(),
                expires_at: Instant::now() + ttl,
            },
        );
        info!(key, ttl_secs = ttl.as_secs(), "Cache set");
    }

    /// Store with the cache's default TTL.
    pub fn insert<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        self.set(key, value, self.default_ttl);
    }

    pub fn delete(&self, key: &str) {
        self.entries.remove(key);
        info!(key, "Cache delete");
    }

    pub fn clear(&self) {
        self.entries.clear();
        info!("Cache clear");
    }

    /// Return the cached value for `key`, or compute, store and return it.
    pub async fn get_or_set<T, F, Fut>(&self, key: &str, compute: F, ttl: Duration) -> T
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(cached) = self.get(key) {
            return cached;
        }

        let value = compute().await;
        self.set(key, &value, ttl);
        value
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            debug!(purged, "Purged expired cache entries");
        }
        purged
    }

    /// Number of stored entries, expired ones included until they are purged
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListingRecord;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(title: &str) -> ListingRecord {
        ListingRecord {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_set_then_get() {
        let cache = ResultCache::new();
        let jobs = vec![record("Rust Engineer"), record("Go Engineer")];

        cache.set("k", &jobs, DEFAULT_CACHE_TTL);

        let cached: Vec<ListingRecord> = cache.get("k").unwrap();
        assert_eq!(cached, jobs);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let cache = ResultCache::new();
        assert!(cache.get::<Vec<ListingRecord>>("nope").is_none());
    }

    #[test]
    fn test_empty_list_is_a_hit() {
        let cache = ResultCache::new();
        cache.insert("empty", &Vec::<ListingRecord>::new());

        let cached: Option<Vec<ListingRecord>> = cache.get("empty");
        assert_eq!(cached, Some(Vec::new()));
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = ResultCache::new();
        cache.set("k", &vec![record("a")], Duration::ZERO);

        assert!(cache.get::<Vec<ListingRecord>>("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_undecodable_entry_is_a_miss() {
        let cache = ResultCache::new();
        cache.insert("k", &"not a list");

        assert!(cache.get::<Vec<ListingRecord>>("k").is_none());
    }

    #[test]
    fn test_delete_and_clear() {
        let cache = ResultCache::new();
        cache.insert("a", &1);
        cache.insert("b", &2);

        cache.delete("a");
        assert!(cache.get::<i32>("a").is_none());
        assert_eq!(cache.get::<i32>("b"), Some(2));

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let cache = ResultCache::new();
        cache.set("old", &1, Duration::ZERO);
        cache.set("fresh", &2, DEFAULT_CACHE_TTL);

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_get_or_set_computes_once() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Vec<ListingRecord> = cache
                .get_or_set(
                    "jobs",
                    || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        vec![record("Rust Engineer")]
                    },
                    DEFAULT_CACHE_TTL,
                )
                .await;
            assert_eq!(value.len(), 1);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_writers() {
        let cache = Arc::new(ResultCache::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move {
                    cache.insert(&format!("key-{i}"), &i);
                    cache.get::<i32>(&format!("key-{i}"))
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), Some(i as i32));
        }
        assert_eq!(cache.len(), 8);
    }
}

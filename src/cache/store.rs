//! Per-cache-name asset storage.
//!
//! Each cache name owns a bounded map ordered by insertion. Reads use `peek`, so a
//! hit never refreshes an entry's position and eviction stays oldest-inserted first.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use lru::LruCache;
use metrics::counter;
use tokio::time::Instant;
use tracing::debug;

use super::lock::{rw_read, rw_write};
use super::network::AssetResponse;
use super::policy::CacheRule;

const SOURCE: &str = "cache::store";

#[derive(Debug, Clone)]
pub struct StoredAsset {
    pub response: AssetResponse,
    pub stored_at: Instant,
}

impl StoredAsset {
    pub fn is_expired(&self, max_age: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > max_age
    }
}

#[derive(Default)]
pub struct AssetStore {
    caches: RwLock<HashMap<&'static str, LruCache<String, StoredAsset>>>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached entry for `url` in the rule's cache, expired or not.
    pub fn get(&self, rule: &CacheRule, url: &str) -> Option<StoredAsset> {
        rw_read(&self.caches, SOURCE, "get")
            .get(rule.cache_name)
            .and_then(|cache| cache.peek(url))
            .cloned()
    }

    /// Store `response`, evicting the oldest entry when the cache is full.
    /// Returns the evicted URL, if any.
    pub fn put(&self, rule: &CacheRule, url: &str, response: AssetResponse) -> Option<String> {
        let entry = StoredAsset {
            response,
            stored_at: Instant::now(),
        };

        let mut caches = rw_write(&self.caches, SOURCE, "put");
        let cache = caches
            .entry(rule.cache_name)
            .or_insert_with(|| LruCache::new(rule.max_entries));

        let evicted = cache
            .push(url.to_string(), entry)
            .map(|(key, _)| key)
            .filter(|key| key != url);

        if let Some(key) = evicted.as_ref() {
            counter!("agency_asset_cache_evict_total", "cache" => rule.cache_name).increment(1);
            debug!(cache = rule.cache_name, evicted = %key, "asset cache full, evicted oldest entry");
        }
        evicted
    }

    pub fn remove(&self, rule: &CacheRule, url: &str) {
        if let Some(cache) = rw_write(&self.caches, SOURCE, "remove").get_mut(rule.cache_name) {
            cache.pop(url);
        }
    }

    /// Number of entries held under `cache_name`.
    pub fn len(&self, cache_name: &str) -> usize {
        rw_read(&self.caches, SOURCE, "len")
            .get(cache_name)
            .map_or(0, LruCache::len)
    }

    /// URLs under `cache_name`, oldest first.
    pub fn urls(&self, cache_name: &str) -> Vec<String> {
        rw_read(&self.caches, SOURCE, "urls")
            .get(cache_name)
            .map(|cache| cache.iter().rev().map(|(url, _)| url.clone()).collect())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        rw_write(&self.caches, SOURCE, "clear").clear();
    }
}

//! Time-bounded storage for rendered pages.

use std::sync::RwLock;
use std::time::Duration;

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;
use tokio::time::Instant;

use super::config::PageCacheConfig;
use super::keys::PageKey;
use super::lock::{rw_read, rw_write};
use super::METRIC_PAGE_CACHE_EVICT;

const SOURCE: &str = "cache::store";

/// Rendered response as it was first served.
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub stored_at: Instant,
}

pub struct PageCache {
    entries: RwLock<LruCache<PageKey, CachedPage>>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(config: &PageCacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
            ttl: config.ttl(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `key`. Expired entries are dropped on the way out.
    pub fn get(&self, key: &PageKey) -> Option<CachedPage> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");

        let fresh = entries
            .get(key)
            .map(|page| now.saturating_duration_since(page.stored_at) < self.ttl)?;
        if fresh {
            entries.get(key).cloned()
        } else {
            entries.pop(key);
            None
        }
    }

    /// Store a page, returning the key pushed out by capacity, if any.
    pub fn insert(&self, key: PageKey, page: CachedPage) -> Option<PageKey> {
        let evicted = rw_write(&self.entries, SOURCE, "insert")
            .push(key.clone(), page)
            .map(|(evicted_key, _)| evicted_key)
            .filter(|evicted_key| *evicted_key != key);

        if evicted.is_some() {
            counter!(METRIC_PAGE_CACHE_EVICT).increment(1);
        }
        evicted
    }

    /// Drop every stored page. Returns how many were dropped.
    pub fn invalidate_all(&self) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "invalidate_all");
        let dropped = entries.len();
        entries.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &'static str) -> CachedPage {
        CachedPage {
            status: 200,
            headers: vec![("content-type".into(), "text/html; charset=utf-8".into())],
            body: Bytes::from_static(body.as_bytes()),
            stored_at: Instant::now(),
        }
    }

    fn cache(ttl_seconds: u64, capacity: usize) -> PageCache {
        PageCache::new(&PageCacheConfig {
            ttl_seconds,
            capacity,
            ..Default::default()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn entry_is_served_until_ttl_elapses() {
        let cache = cache(20, 8);
        let key = PageKey::new("/", "", None);
        cache.insert(key.clone(), page("feed"));

        tokio::time::advance(Duration::from_secs(19)).await;
        let hit = cache.get(&key).expect("fresh entry");
        assert_eq!(hit.body, Bytes::from_static(b"feed"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn capacity_evicts_least_recent() {
        let cache = cache(20, 2);
        let first = PageKey::new("/", "page=1", None);
        let second = PageKey::new("/", "page=2", None);
        let third = PageKey::new("/", "page=3", None);

        assert!(cache.insert(first.clone(), page("1")).is_none());
        assert!(cache.insert(second, page("2")).is_none());
        assert_eq!(cache.insert(third, page("3")), Some(first));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn replacing_a_key_is_not_an_eviction() {
        let cache = cache(20, 2);
        let key = PageKey::new("/", "", None);
        cache.insert(key.clone(), page("old"));
        assert!(cache.insert(key.clone(), page("new")).is_none());
        assert_eq!(cache.get(&key).expect("entry").body, Bytes::from_static(b"new"));
    }

    #[test]
    fn invalidate_all_empties_the_cache() {
        let cache = cache(20, 8);
        cache.insert(PageKey::new("/", "", None), page("a"));
        cache.insert(PageKey::new("/", "", Some("leo".into())), page("b"));

        assert_eq!(cache.invalidate_all(), 2);
        assert!(cache.is_empty());
    }
}

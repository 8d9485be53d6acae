//! Page cache for the global feed.
//!
//! Rendered responses are kept in an LRU map for a fixed window and served
//! byte-for-byte until they expire or an operator clears the cache. Writes do
//! not invalidate entries; readers may see a stale feed for up to one window.
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 20
//! capacity = 256
//! vary_by_viewer = true
//! ```

mod config;
mod keys;
mod lock;
mod middleware;
mod store;

pub use config::PageCacheConfig;
pub use keys::PageKey;
pub use middleware::{MAX_CACHED_BODY_BYTES, PageCacheState, page_cache_layer};
pub use store::{CachedPage, PageCache};

pub const METRIC_PAGE_CACHE_HIT: &str = "scribe_page_cache_hit_total";
pub const METRIC_PAGE_CACHE_MISS: &str = "scribe_page_cache_miss_total";
pub const METRIC_PAGE_CACHE_STORE: &str = "scribe_page_cache_store_total";
pub const METRIC_PAGE_CACHE_EVICT: &str = "scribe_page_cache_evict_total";

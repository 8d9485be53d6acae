//! Page cache configuration.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_TTL_SECONDS: u64 = 20;
const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageCacheConfig {
    /// Serve the global feed from the cache.
    pub enabled: bool,
    /// How long a stored page stays fresh.
    pub ttl_seconds: u64,
    /// Maximum number of stored pages.
    pub capacity: usize,
    /// Store one copy per signed-in viewer instead of one per URL.
    pub vary_by_viewer: bool,
}

impl Default for PageCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: DEFAULT_TTL_SECONDS,
            capacity: DEFAULT_CAPACITY,
            vary_by_viewer: true,
        }
    }
}

impl From<&crate::config::CacheSettings> for PageCacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl_seconds: settings.ttl.as_secs(),
            capacity: settings.capacity.get(),
            vary_by_viewer: settings.vary_by_viewer,
        }
    }
}

impl PageCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Capacity as `NonZeroUsize`, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

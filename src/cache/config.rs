//! Tunables shared by the snapshot cache, the query response cache and the
//! list views built on them.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_PAGE_SIZE: usize = 20;
const DEFAULT_QUERY_PAGE_SIZE: usize = 10;
const DEFAULT_QUERY_TTL_SECS: u64 = 300;
const DEFAULT_QUERY_CACHE_LIMIT: usize = 64;
const DEFAULT_RESTAURANT_SLOTS: usize = 1;
const DEFAULT_FETCH_LIMIT: u32 = 1000;

/// Usually built from the `[cache]` settings table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Display window increment of the cached list views.
    pub page_size: usize,
    /// Display window increment of the query list views.
    pub query_page_size: usize,
    /// Lifetime of a query list response.
    pub query_ttl_secs: u64,
    /// Maximum distinct query responses kept.
    pub query_cache_limit: usize,
    /// Number of restaurants whose snapshot is retained. One keeps only the
    /// most recently loaded restaurant.
    pub restaurant_slots: usize,
    /// `limit` sent with every list request.
    pub fetch_limit: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            query_page_size: DEFAULT_QUERY_PAGE_SIZE,
            query_ttl_secs: DEFAULT_QUERY_TTL_SECS,
            query_cache_limit: DEFAULT_QUERY_CACHE_LIMIT,
            restaurant_slots: DEFAULT_RESTAURANT_SLOTS,
            fetch_limit: DEFAULT_FETCH_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            page_size: settings.page_size.get(),
            query_page_size: settings.query_page_size.get(),
            query_ttl_secs: settings.query_ttl.as_secs(),
            query_cache_limit: settings.query_cache_limit.get(),
            restaurant_slots: settings.restaurant_slots.get(),
            fetch_limit: settings.fetch_limit.get(),
        }
    }
}

impl CacheConfig {
    pub fn query_ttl(&self) -> Duration {
        Duration::from_secs(self.query_ttl_secs)
    }

    /// LRU capacity for restaurant snapshots. Zero is read as one.
    pub fn restaurant_slots_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.restaurant_slots).unwrap_or(NonZeroUsize::MIN)
    }

    /// LRU capacity for query responses. Zero is read as one.
    pub fn query_cache_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.query_cache_limit).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn page_size_non_zero(&self) -> usize {
        self.page_size.max(1)
    }

    pub fn query_page_size_non_zero(&self) -> usize {
        self.query_page_size.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_backend_paging() {
        let config = CacheConfig::default();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.query_page_size, 10);
        assert_eq!(config.query_ttl(), Duration::from_secs(300));
        assert_eq!(config.query_cache_limit, 64);
        assert_eq!(config.restaurant_slots, 1);
        assert_eq!(config.fetch_limit, 1000);
    }

    #[test]
    fn zero_capacities_read_as_one() {
        let config = CacheConfig {
            restaurant_slots: 0,
            query_cache_limit: 0,
            page_size: 0,
            ..Default::default()
        };
        assert_eq!(config.restaurant_slots_non_zero().get(), 1);
        assert_eq!(config.query_cache_limit_non_zero().get(), 1);
        assert_eq!(config.page_size_non_zero(), 1);
    }
}

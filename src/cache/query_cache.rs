//! Time-bounded response cache for direct list queries.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use lru::LruCache;
use metrics::counter;
use tokio::time::Instant;

use crate::application::repos::ListParams;

use super::config::CacheConfig;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::query_cache";

struct Entry<T> {
    fetched_at: Instant,
    items: Arc<Vec<T>>,
}

/// LRU of list responses keyed by request parameters. Entries older than the
/// configured lifetime are treated as misses and dropped on access.
pub struct QueryCache<T> {
    ttl: Duration,
    entries: Mutex<LruCache<ListParams, Entry<T>>>,
}

impl<T> QueryCache<T> {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            ttl: config.query_ttl(),
            entries: Mutex::new(LruCache::new(config.query_cache_limit_non_zero())),
        }
    }

    pub fn get(&self, params: &ListParams) -> Option<Arc<Vec<T>>> {
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");
        let fresh = entries
            .get(params)
            .map(|entry| (entry.fetched_at.elapsed() < self.ttl, entry.items.clone()));

        match fresh {
            Some((true, items)) => {
                counter!("brigade_query_cache_hit_total").increment(1);
                Some(items)
            }
            Some((false, _)) => {
                entries.pop(params);
                counter!("brigade_query_cache_miss_total").increment(1);
                None
            }
            None => {
                counter!("brigade_query_cache_miss_total").increment(1);
                None
            }
        }
    }

    pub fn put(&self, params: ListParams, items: Vec<T>) -> Arc<Vec<T>> {
        let items = Arc::new(items);
        mutex_lock(&self.entries, SOURCE, "put").put(
            params,
            Entry {
                fetched_at: Instant::now(),
                items: items.clone(),
            },
        );
        items
    }

    pub fn invalidate_all(&self) {
        mutex_lock(&self.entries, SOURCE, "invalidate_all").clear();
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

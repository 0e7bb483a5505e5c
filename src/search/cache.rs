//! Short-lived product cache keyed by `(marketplace, query)`.
//!
//! Entries carry their own creation time and freshness is decided on read,
//! so a stale entry stays in the map until it is overwritten or evicted for
//! capacity. [`moka`] only bounds the size.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use storefront_catalog::Product;
use tokio::time::Instant;

/// Cache key: marketplace id plus the resolved catalog query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub marketplace_id: String,
    pub query: String,
}

impl CacheKey {
    pub fn new(marketplace_id: &str, query: &str) -> Self {
        Self {
            marketplace_id: marketplace_id.to_owned(),
            query: query.to_owned(),
        }
    }
}

/// Deduplicated, ranked, unfiltered products and when they were fetched.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub products: Arc<Vec<Product>>,
    pub created_at: Instant,
}

impl CacheEntry {
    /// Entry stamped with the current time.
    pub fn now(products: Vec<Product>) -> Self {
        Self {
            products: Arc::new(products),
            created_at: Instant::now(),
        }
    }

    /// Whether the entry is younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() < ttl
    }
}

/// Bounded product cache with read-time freshness.
#[derive(Clone)]
pub struct ProductCache {
    entries: Cache<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl std::fmt::Debug for ProductCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductCache")
            .field("entries", &self.entries.entry_count())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl ProductCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(max_entries).build(),
            ttl,
        }
    }

    /// Fresh entry for `key`, or `None` when absent or stale.
    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let entry = self.entries.get(key).await?;
        if entry.is_fresh(self.ttl) {
            Some(entry)
        } else {
            tracing::debug!(
                marketplace = %key.marketplace_id,
                age_secs = entry.created_at.elapsed().as_secs(),
                "cache entry stale"
            );
            None
        }
    }

    /// Store `entry`, replacing any previous one for `key`.
    pub async fn put(&self, key: CacheKey, entry: CacheEntry) {
        self.entries.insert(key, entry).await;
    }
}

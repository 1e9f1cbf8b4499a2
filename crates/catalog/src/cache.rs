//! Read-through product cache port.
//!
//! Explicit contract instead of framework annotation magic: the service
//! consults the cache on reads, fills it on miss, and evicts the entry
//! on every mutation so a deleted or updated product is never served
//! stale past its own write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::ProductId;
use tokio::sync::RwLock;

use crate::product::Product;

/// Cache tuning knobs.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long an entry stays valid after being set.
    pub ttl: Duration,
}

impl CacheConfig {
    /// Loads configuration from `CACHE_TTL_SECS`, defaulting to 600.
    pub fn from_env() -> Self {
        let ttl_secs = std::env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(600);
        Self {
            ttl: Duration::from_secs(ttl_secs),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
        }
    }
}

/// Side-channel cache for single-product reads.
#[async_trait]
pub trait ProductCache: Send + Sync {
    /// Returns the cached product if present and not expired.
    async fn get(&self, id: ProductId) -> Option<Product>;

    /// Stores a product under its id.
    async fn set(&self, product: &Product);

    /// Removes the entry for an id, if any.
    async fn evict(&self, id: ProductId);
}

/// In-memory TTL cache standing in for the managed key-value store.
#[derive(Clone)]
pub struct InMemoryProductCache {
    entries: Arc<RwLock<HashMap<ProductId, (Product, Instant)>>>,
    ttl: Duration,
}

impl InMemoryProductCache {
    /// Creates a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl: config.ttl,
        }
    }

    /// Number of live (possibly expired) entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ProductCache for InMemoryProductCache {
    async fn get(&self, id: ProductId) -> Option<Product> {
        let entries = self.entries.read().await;
        let (product, stored_at) = entries.get(&id)?;
        if stored_at.elapsed() > self.ttl {
            metrics::counter!("catalog_cache_expired").increment(1);
            return None;
        }
        metrics::counter!("catalog_cache_hits").increment(1);
        Some(product.clone())
    }

    async fn set(&self, product: &Product) {
        self.entries
            .write()
            .await
            .insert(product.id, (product.clone(), Instant::now()));
    }

    async fn evict(&self, id: ProductId) {
        self.entries.write().await.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::UserId;

    fn product() -> Product {
        Product::create(
            "Monitor Arm",
            8_900,
            5,
            vec!["office".to_string()],
            None,
            None,
            UserId::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn set_then_get() {
        let cache = InMemoryProductCache::new(CacheConfig::default());
        let p = product();
        cache.set(&p).await;
        assert_eq!(cache.get(p.id).await, Some(p));
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache = InMemoryProductCache::new(CacheConfig {
            ttl: Duration::from_millis(0),
        });
        let p = product();
        cache.set(&p).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cache.get(p.id).await, None);
    }

    #[tokio::test]
    async fn evict_removes_entry() {
        let cache = InMemoryProductCache::new(CacheConfig::default());
        let p = product();
        cache.set(&p).await;
        cache.evict(p.id).await;
        assert_eq!(cache.get(p.id).await, None);
        assert!(cache.is_empty().await);
    }
}

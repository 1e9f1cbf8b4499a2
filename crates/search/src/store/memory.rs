//! In-memory read store for unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use common::ProductId;
use tokio::sync::RwLock;

use crate::error::{Result, SearchError};
use crate::row::ProductRow;
use crate::store::{ProductQuery, ReadStore};

/// In-memory read store mirroring the PostgreSQL implementation,
/// with an injectable failure count for retry and dead-letter tests.
#[derive(Clone, Default)]
pub struct InMemoryReadStore {
    rows: Arc<RwLock<HashMap<ProductId, ProductRow>>>,
    failures_remaining: Arc<AtomicU32>,
}

impl InMemoryReadStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` write operations fail with a retryable error.
    pub fn fail_writes(&self, n: u32) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<()> {
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(SearchError::StoreUnavailable(
                "injected write failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ReadStore for InMemoryReadStore {
    async fn find_by_id(&self, id: ProductId) -> Result<Option<ProductRow>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn upsert(&self, row: &ProductRow) -> Result<()> {
        self.check_failure()?;
        self.rows.write().await.insert(row.id, row.clone());
        Ok(())
    }

    async fn delete_by_id(&self, id: ProductId) -> Result<()> {
        self.check_failure()?;
        self.rows.write().await.remove(&id);
        Ok(())
    }

    async fn query(&self, query: &ProductQuery) -> Result<Vec<ProductRow>> {
        let rows = self.rows.read().await;
        let mut matched: Vec<_> = rows
            .values()
            .filter(|row| {
                query
                    .name_prefix
                    .as_deref()
                    .is_none_or(|prefix| row.name.starts_with(prefix))
                    && query
                        .category
                        .as_deref()
                        .is_none_or(|category| row.category.as_deref() == Some(category))
                    && query
                        .min_price_cents
                        .is_none_or(|min| row.price_cents >= min)
                    && query
                        .max_price_cents
                        .is_none_or(|max| row.price_cents <= max)
            })
            .cloned()
            .collect();
        matched.sort_by_key(|row| row.id);
        Ok(matched
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.rows.read().await.len() as u64)
    }
}

//! Primary store port for the catalog service.
//!
//! The real deployment backs this with a document store; the port only
//! specifies the operations the write path needs. The in-memory
//! implementation doubles as the test double, with an injectable
//! failure for exercising the `PersistenceFailed` path.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use common::ProductId;
use tokio::sync::RwLock;

use crate::error::{CatalogError, Result};
use crate::product::Product;

/// One page of products, ordered by id (creation order).
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Product>,
    pub total: usize,
}

/// Primary (write-side) product store.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Inserts a new product.
    async fn insert(&self, product: &Product) -> Result<()>;

    /// Finds a product by id.
    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>>;

    /// Replaces the stored state of an existing product.
    async fn update(&self, product: &Product) -> Result<()>;

    /// Deletes a product by id. Returns whether a product was removed.
    async fn delete_by_id(&self, id: ProductId) -> Result<bool>;

    /// Lists products ordered by id with limit/offset pagination.
    async fn list(&self, limit: usize, offset: usize) -> Result<Page>;
}

/// In-memory primary store implementation.
#[derive(Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
    fail_next_write: Arc<AtomicBool>,
}

impl InMemoryProductRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next write operation fail with `PersistenceFailed`.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    fn check_failure(&self) -> Result<()> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(CatalogError::PersistenceFailed(
                "injected write failure".to_string(),
            ));
        }
        Ok(())
    }

    /// Number of stored products.
    pub async fn count(&self) -> usize {
        self.products.read().await.len()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn insert(&self, product: &Product) -> Result<()> {
        self.check_failure()?;
        self.products
            .write()
            .await
            .insert(product.id, product.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn update(&self, product: &Product) -> Result<()> {
        self.check_failure()?;
        let mut products = self.products.write().await;
        if !products.contains_key(&product.id) {
            return Err(CatalogError::NotFound(product.id));
        }
        products.insert(product.id, product.clone());
        Ok(())
    }

    async fn delete_by_id(&self, id: ProductId) -> Result<bool> {
        self.check_failure()?;
        Ok(self.products.write().await.remove(&id).is_some())
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Page> {
        let products = self.products.read().await;
        let mut items: Vec<_> = products.values().cloned().collect();
        // ProductId is time-ordered, so id order is creation order.
        items.sort_by_key(|p| p.id);
        let total = items.len();
        let items = items.into_iter().skip(offset).take(limit).collect();
        Ok(Page { items, total })
    }
}

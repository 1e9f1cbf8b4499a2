//! The catalog mutation workflow.

use broker::MessageBroker;
use common::{ProductId, UserId};
use serde::Deserialize;

use crate::cache::ProductCache;
use crate::error::{CatalogError, Result};
use crate::product::{Product, UpdateProduct};
use crate::publisher::ProductEventPublisher;
use crate::repository::{Page, ProductRepository};

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub price_cents: i64,
    pub stock: u32,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub user_id: UserId,
}

/// Orchestrates catalog mutations.
///
/// Every mutation follows the same discipline: validate, commit to the
/// primary store, evict the cache entry, then publish exactly one
/// event. The publish sits outside the store transaction on purpose —
/// cross-system atomicity between store and broker is not attempted, so
/// a failed publish leaves the write durable and the projection stale
/// (at-least-once, eventually consistent).
pub struct CatalogService<R, C, B>
where
    R: ProductRepository,
    C: ProductCache,
    B: MessageBroker,
{
    repository: R,
    cache: C,
    publisher: ProductEventPublisher<B>,
}

impl<R, C, B> CatalogService<R, C, B>
where
    R: ProductRepository,
    C: ProductCache,
    B: MessageBroker,
{
    /// Creates a new service.
    pub fn new(repository: R, cache: C, broker: B) -> Self {
        Self {
            repository,
            cache,
            publisher: ProductEventPublisher::new(broker),
        }
    }

    /// Creates a product and publishes `product-created`.
    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CreateProduct) -> Result<Product> {
        let product = Product::create(
            input.name,
            input.price_cents,
            input.stock,
            input.tags,
            input.category,
            input.description,
            input.user_id,
        )?;

        self.repository.insert(&product).await?;
        self.publisher.publish_created(&product).await?;

        metrics::counter!("catalog_products_created").increment(1);
        Ok(product)
    }

    /// Updates a product and publishes `product-updated` with a patch
    /// carrying only the changed fields.
    #[tracing::instrument(skip(self, update))]
    pub async fn update(&self, id: ProductId, update: UpdateProduct) -> Result<Product> {
        let existing = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(id))?;

        let (next, patch) = existing.apply_update(update)?;
        self.repository.update(&next).await?;
        self.cache.evict(id).await;

        self.publisher.publish_updated(patch).await?;
        Ok(next)
    }

    /// Deletes a product and publishes `product-deleted`.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<()> {
        if !self.repository.delete_by_id(id).await? {
            return Err(CatalogError::NotFound(id));
        }
        self.cache.evict(id).await;

        self.publisher.publish_deleted(id).await?;
        Ok(())
    }

    /// Reads a product, going through the cache.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>> {
        if let Some(product) = self.cache.get(id).await {
            return Ok(Some(product));
        }
        let product = self.repository.find_by_id(id).await?;
        if let Some(ref product) = product {
            self.cache.set(product).await;
        }
        Ok(product)
    }

    /// Lists products in creation order.
    pub async fn list(&self, limit: usize, offset: usize) -> Result<Page> {
        self.repository.list(limit, offset).await
    }
}

//! Read store port and implementations.

mod memory;
mod postgres;

use async_trait::async_trait;
use common::ProductId;

use crate::error::Result;
use crate::row::ProductRow;

pub use memory::InMemoryReadStore;
pub use postgres::PostgresReadStore;

/// Query filters for the search API.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    /// Case-sensitive name prefix.
    pub name_prefix: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    /// Inclusive lower price bound, minor units.
    pub min_price_cents: Option<i64>,
    /// Inclusive upper price bound, minor units.
    pub max_price_cents: Option<i64>,
    pub limit: usize,
    pub offset: usize,
}

impl ProductQuery {
    /// A query returning the first `limit` rows with no filters.
    pub fn all(limit: usize) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }
}

/// Relational read store for the product projection.
///
/// `upsert` must be a single atomic insert-or-update statement so
/// concurrent consumer instances cannot interleave a lost update. The
/// adapter executes decisions; it never decides idempotency — that is
/// the reconciler's job.
#[async_trait]
pub trait ReadStore: Send + Sync {
    /// Fetches the row for an id, if any.
    async fn find_by_id(&self, id: ProductId) -> Result<Option<ProductRow>>;

    /// Inserts the row or replaces the existing row with the same id,
    /// atomically.
    async fn upsert(&self, row: &ProductRow) -> Result<()>;

    /// Deletes the row for an id. Deleting an absent id is not an
    /// error.
    async fn delete_by_id(&self, id: ProductId) -> Result<()>;

    /// Runs a filtered, paginated query ordered by id.
    async fn query(&self, query: &ProductQuery) -> Result<Vec<ProductRow>>;

    /// Number of rows in the projection.
    async fn count(&self) -> Result<u64>;
}

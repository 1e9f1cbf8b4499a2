//! Catalog error taxonomy.
//!
//! `PersistenceFailed` and `ProjectionPublishFailed` are deliberately
//! distinct kinds: the first means the mutation did not happen and the
//! whole write may be retried, the second means the mutation is durable
//! but the projection is stale, so only the publish should be retried.

use common::ProductId;
use thiserror::Error;

/// Errors surfaced by the catalog service.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A field failed write-side validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The product does not exist in the primary store.
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The primary store write failed; the mutation did not happen.
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    /// The mutation committed but the event publish failed. The write
    /// is durable and the projection is stale until the publish is
    /// retried or the stream is replayed.
    #[error("Projection publish failed for product {id}: {source}")]
    ProjectionPublishFailed {
        id: ProductId,
        #[source]
        source: broker::BrokerError,
    },

    /// The event payload could not be serialized.
    #[error("Event serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

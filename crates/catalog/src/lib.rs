//! Write-side product catalog service.
//!
//! Owns the primary product store and publishes one lifecycle event per
//! successful mutation, strictly after the store commit:
//! - [`Product`] — the write-side entity with field validation
//! - [`ProductRepository`] — primary (document) store port
//! - [`ProductCache`] — read-through cache port with TTL and
//!   invalidate-on-write
//! - [`ProductEventPublisher`] — serializes mutations onto the broker
//! - [`CatalogService`] — the mutation workflow, with the
//!   `PersistenceFailed` / `ProjectionPublishFailed` error split

pub mod cache;
pub mod error;
pub mod product;
pub mod publisher;
pub mod repository;
pub mod service;

pub use cache::{CacheConfig, InMemoryProductCache, ProductCache};
pub use error::{CatalogError, Result};
pub use product::{Product, UpdateProduct};
pub use publisher::ProductEventPublisher;
pub use repository::{InMemoryProductRepository, Page, ProductRepository};
pub use service::CatalogService;

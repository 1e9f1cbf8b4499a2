//! Wire schema for product lifecycle events.
//!
//! This crate defines the contract between the catalog (producer) and
//! search (consumer) services:
//! - [`ProductEvent`] — tagged union of `Created` / `Updated` / `Deleted`
//! - [`ProductSnapshot`] — full product state carried by `Created`
//! - [`ProductPatch`] — partial state carried by `Updated`
//!
//! The format is forward-compatible: unknown fields are ignored on read
//! so producer and consumer can evolve independently. A missing required
//! field is a hard decode error, never a silent default.

pub mod error;
pub mod event;
pub mod snapshot;

pub use error::{EventError, Result};
pub use event::{
    ProductDeletedData, ProductEvent, TOPIC_PRODUCT_CREATED, TOPIC_PRODUCT_DELETED,
    TOPIC_PRODUCT_UPDATED, TOPICS,
};
pub use snapshot::{ProductPatch, ProductSnapshot};

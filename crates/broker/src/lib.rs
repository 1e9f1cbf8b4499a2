//! Message broker port for the catalog/search pipeline.
//!
//! The broker is an external collaborator; this crate only specifies
//! the surface the pipeline touches:
//! - [`MessageBroker`] — `publish(topic, key, payload)` and
//!   `subscribe(topic)` yielding a stream of [`Delivery`] values
//! - [`InMemoryBroker`] — at-least-once, per-topic-ordered
//!   implementation used by tests and the demo binary
//!
//! Consumers must assume at-least-once delivery and no cross-partition
//! ordering; all idempotency lives downstream of this crate.

pub mod error;
pub mod memory;
pub mod message;

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

pub use error::{BrokerError, Result};
pub use memory::InMemoryBroker;
pub use message::{AckToken, Delivery};

/// A stream of message deliveries for one topic subscription.
pub type DeliveryStream = Pin<Box<dyn Stream<Item = Delivery> + Send>>;

/// Core trait for broker implementations.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publishes a payload on a topic, routed by `key`.
    ///
    /// Messages with the same key land on the same partition, so
    /// per-key publish order is preserved for any single subscriber.
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<()>;

    /// Subscribes to a topic, returning a stream of deliveries.
    ///
    /// Each delivery carries an [`AckToken`]; a delivery that is never
    /// acknowledged is considered unprocessed and may be redelivered.
    async fn subscribe(&self, topic: &str) -> Result<DeliveryStream>;
}

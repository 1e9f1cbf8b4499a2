//! Delivery and acknowledgement types.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Acknowledgement handle for one delivery.
///
/// Acknowledging marks the message as processed; a token dropped
/// without acknowledgement leaves the message eligible for redelivery.
#[derive(Debug)]
pub struct AckToken {
    acked: Arc<AtomicBool>,
    topic_acked: Arc<AtomicU64>,
}

impl AckToken {
    pub(crate) fn new(topic_acked: Arc<AtomicU64>) -> Self {
        Self {
            acked: Arc::new(AtomicBool::new(false)),
            topic_acked,
        }
    }

    /// Marks the delivery as processed. Idempotent.
    pub fn ack(&self) {
        if !self.acked.swap(true, Ordering::SeqCst) {
            self.topic_acked.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Whether this delivery has been acknowledged.
    pub fn is_acked(&self) -> bool {
        self.acked.load(Ordering::SeqCst)
    }
}

/// A single message delivered from a topic subscription.
#[derive(Debug)]
pub struct Delivery {
    /// Topic the message was published on.
    pub topic: String,

    /// Routing key (the product id for lifecycle events).
    pub key: String,

    /// Raw message payload.
    pub payload: Vec<u8>,

    /// Acknowledgement handle.
    pub ack: AckToken,
}

//! Dead-letter parking for events that exhausted their retry budget.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use events::ProductEvent;
use tokio::sync::RwLock;

/// One parked event with the error that exhausted its retries.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub event: ProductEvent,
    pub error: String,
    pub attempts: u32,
    pub parked_at: DateTime<Utc>,
}

/// Holding area for events that failed processing after bounded
/// retries, kept for inspection and replay so the projection's
/// staleness stays observable and repairable.
#[derive(Clone, Default)]
pub struct DeadLetterQueue {
    entries: Arc<RwLock<Vec<DeadLetter>>>,
}

impl DeadLetterQueue {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parks an event.
    pub async fn park(&self, event: ProductEvent, error: String, attempts: u32) {
        metrics::counter!("reconciler_events_dead_lettered").increment(1);
        tracing::error!(
            product_id = %event.product_id(),
            event_type = event.event_type(),
            attempts,
            %error,
            "event parked in dead-letter queue"
        );
        self.entries.write().await.push(DeadLetter {
            event,
            error,
            attempts,
            parked_at: Utc::now(),
        });
    }

    /// Removes and returns all parked events, oldest first. Used for
    /// manual replay.
    pub async fn drain(&self) -> Vec<DeadLetter> {
        std::mem::take(&mut *self.entries.write().await)
    }

    /// Number of parked events.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the queue is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

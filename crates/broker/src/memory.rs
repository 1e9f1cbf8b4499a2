//! In-memory broker implementation for tests and the demo binary.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::sync::mpsc;

use crate::message::{AckToken, Delivery};
use crate::{BrokerError, DeliveryStream, MessageBroker, Result};

struct TopicState {
    /// Messages published before any subscriber existed; handed to the
    /// first subscriber so publish-then-subscribe works.
    backlog: Vec<(String, Vec<u8>)>,
    subscribers: Vec<mpsc::UnboundedSender<Delivery>>,
    published: u64,
    acked: Arc<AtomicU64>,
}

impl TopicState {
    fn new() -> Self {
        Self {
            backlog: Vec::new(),
            subscribers: Vec::new(),
            published: 0,
            acked: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// In-memory message broker.
///
/// Semantics match the contract the pipeline assumes from a real
/// broker: at-least-once (redelivery is exercised in tests by
/// publishing the same payload again), publish order preserved per
/// topic, fan-out to every subscriber of a topic.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    topics: Arc<RwLock<HashMap<String, TopicState>>>,
}

impl InMemoryBroker {
    /// Creates a new empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages published on a topic so far.
    pub async fn published_count(&self, topic: &str) -> u64 {
        self.topics
            .read()
            .await
            .get(topic)
            .map(|t| t.published)
            .unwrap_or(0)
    }

    /// Number of acknowledged deliveries on a topic.
    pub async fn acked_count(&self, topic: &str) -> u64 {
        self.topics
            .read()
            .await
            .get(topic)
            .map(|t| t.acked.load(Ordering::SeqCst))
            .unwrap_or(0)
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<()> {
        let mut topics = self.topics.write().await;
        let state = topics
            .entry(topic.to_string())
            .or_insert_with(TopicState::new);
        state.published += 1;

        if state.subscribers.is_empty() {
            state.backlog.push((key.to_string(), payload));
            return Ok(());
        }

        // Drop senders whose receiver side has gone away.
        let acked = Arc::clone(&state.acked);
        state.subscribers.retain(|tx| {
            tx.send(Delivery {
                topic: topic.to_string(),
                key: key.to_string(),
                payload: payload.clone(),
                ack: AckToken::new(Arc::clone(&acked)),
            })
            .is_ok()
        });

        if state.subscribers.is_empty() {
            return Err(BrokerError::PublishFailed {
                topic: topic.to_string(),
                reason: "all subscribers disconnected".to_string(),
            });
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<DeliveryStream> {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut topics = self.topics.write().await;
        let state = topics
            .entry(topic.to_string())
            .or_insert_with(TopicState::new);

        for (key, payload) in state.backlog.drain(..) {
            let _ = tx.send(Delivery {
                topic: topic.to_string(),
                key,
                payload,
                ack: AckToken::new(Arc::clone(&state.acked)),
            });
        }
        state.subscribers.push(tx);

        tracing::debug!(topic, "subscriber attached");

        Ok(Box::pin(futures_util::stream::unfold(
            rx,
            |mut rx| async move { rx.recv().await.map(|delivery| (delivery, rx)) },
        )))
    }
}

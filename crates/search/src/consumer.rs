//! The search-side event consumer.
//!
//! One worker task per lifecycle topic. Each worker decodes deliveries,
//! forwards them to the reconciler and acknowledges only after the
//! reconcile completed, so a crash mid-apply leaves the message
//! unacknowledged for redelivery. Consumption is at-least-once; the
//! reconciler owns all ordering and idempotency guarantees.

use std::sync::Arc;

use broker::{Delivery, DeliveryStream, MessageBroker};
use events::{ProductEvent, TOPICS};
use futures_util::StreamExt;
use tokio::sync::watch;

use crate::error::Result;
use crate::reconciler::Reconciler;
use crate::store::ReadStore;

/// Drives the reconciler from broker subscriptions.
pub struct EventConsumer<B, S>
where
    B: MessageBroker,
    S: ReadStore,
{
    broker: B,
    reconciler: Arc<Reconciler<S>>,
    shutdown: watch::Receiver<bool>,
}

impl<B, S> EventConsumer<B, S>
where
    B: MessageBroker + Clone + 'static,
    S: ReadStore + 'static,
{
    /// Creates a consumer and the sender used to request shutdown.
    pub fn new(broker: B, reconciler: Arc<Reconciler<S>>) -> (Self, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                broker,
                reconciler,
                shutdown: rx,
            },
            tx,
        )
    }

    /// Subscribes to every lifecycle topic and runs one worker per
    /// topic until shutdown is requested. In-flight deliveries finish
    /// before a worker exits; unstarted ones stay unacknowledged.
    pub async fn run(self) -> Result<()> {
        let mut handles = Vec::with_capacity(TOPICS.len());

        for topic in TOPICS {
            let stream = self.broker.subscribe(topic).await?;
            let reconciler = Arc::clone(&self.reconciler);
            let shutdown = self.shutdown.clone();
            handles.push(tokio::spawn(worker(topic, stream, reconciler, shutdown)));
        }

        for handle in handles {
            // A worker can only stop by shutdown or stream end; a
            // panic inside one is a bug worth surfacing in logs.
            if let Err(error) = handle.await {
                tracing::error!(%error, "consumer worker task failed");
            }
        }
        Ok(())
    }
}

async fn worker<S: ReadStore>(
    topic: &'static str,
    mut stream: DeliveryStream,
    reconciler: Arc<Reconciler<S>>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(topic, "consumer worker started");

    loop {
        let delivery = tokio::select! {
            biased;
            changed = shutdown.changed() => {
                // Sender dropped also means shutdown.
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
            delivery = stream.next() => match delivery {
                Some(delivery) => delivery,
                None => break,
            },
        };

        // The reconcile-and-ack runs outside the select, so shutdown
        // never abandons an event mid-apply.
        handle_delivery(&reconciler, delivery).await;
    }

    tracing::info!(topic, "consumer worker stopped");
}

async fn handle_delivery<S: ReadStore>(reconciler: &Reconciler<S>, delivery: Delivery) {
    let event: ProductEvent = match serde_json::from_slice(&delivery.payload) {
        Ok(event) => event,
        Err(error) => {
            // A structurally invalid event can never become valid:
            // drop it, don't retry.
            metrics::counter!("consumer_deserialization_failures").increment(1);
            tracing::warn!(
                topic = %delivery.topic,
                key = %delivery.key,
                %error,
                "undecodable event dropped"
            );
            delivery.ack.ack();
            return;
        }
    };

    let outcome = reconciler.process(event).await;
    tracing::debug!(topic = %delivery.topic, key = %delivery.key, ?outcome, "event processed");
    delivery.ack.ack();
}

//! Event publisher for catalog mutations.

use broker::MessageBroker;
use common::ProductId;
use events::{ProductDeletedData, ProductEvent, ProductPatch};

use crate::error::{CatalogError, Result};
use crate::product::Product;

/// Serializes product mutations into lifecycle events and hands them to
/// the broker, keyed by product id.
///
/// The publisher is only ever invoked after the primary store commit
/// succeeded; a publish failure is reported as
/// [`CatalogError::ProjectionPublishFailed`] and never rolls the
/// mutation back.
pub struct ProductEventPublisher<B: MessageBroker> {
    broker: B,
}

impl<B: MessageBroker> ProductEventPublisher<B> {
    /// Creates a publisher over the given broker.
    pub fn new(broker: B) -> Self {
        Self { broker }
    }

    /// Publishes a `Created` event carrying the full snapshot.
    pub async fn publish_created(&self, product: &Product) -> Result<()> {
        self.publish(ProductEvent::Created(product.snapshot())).await
    }

    /// Publishes an `Updated` event carrying the mutation's patch.
    pub async fn publish_updated(&self, patch: ProductPatch) -> Result<()> {
        self.publish(ProductEvent::Updated(patch)).await
    }

    /// Publishes a `Deleted` event carrying only the id.
    pub async fn publish_deleted(&self, id: ProductId) -> Result<()> {
        self.publish(ProductEvent::Deleted(ProductDeletedData { id }))
            .await
    }

    async fn publish(&self, event: ProductEvent) -> Result<()> {
        let id = event.product_id();
        let topic = event.topic();
        let payload = serde_json::to_vec(&event)?;

        self.broker
            .publish(topic, &id.to_string(), payload)
            .await
            .map_err(|source| {
                metrics::counter!("catalog_publish_failures").increment(1);
                tracing::error!(%id, topic, error = %source, "event publish failed, projection is stale");
                CatalogError::ProjectionPublishFailed { id, source }
            })?;

        metrics::counter!("catalog_events_published", "topic" => topic).increment(1);
        tracing::debug!(%id, topic, event_type = event.event_type(), "event published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker::InMemoryBroker;
    use common::UserId;
    use events::TOPIC_PRODUCT_CREATED;
    use futures_util::StreamExt;

    fn product() -> Product {
        Product::create(
            "Webcam",
            6_500,
            9,
            vec!["video".to_string()],
            Some("electronics".to_string()),
            None,
            UserId::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn created_event_lands_on_created_topic_keyed_by_id() {
        let broker = InMemoryBroker::new();
        let mut stream = broker.subscribe(TOPIC_PRODUCT_CREATED).await.unwrap();

        let publisher = ProductEventPublisher::new(broker.clone());
        let p = product();
        publisher.publish_created(&p).await.unwrap();

        let delivery = stream.next().await.unwrap();
        assert_eq!(delivery.key, p.id.to_string());

        let event: ProductEvent = serde_json::from_slice(&delivery.payload).unwrap();
        match event {
            ProductEvent::Created(snapshot) => assert_eq!(snapshot, p.snapshot()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn publish_failure_maps_to_projection_publish_failed() {
        let broker = InMemoryBroker::new();
        // Subscribe and drop so the topic has only dead subscribers.
        drop(broker.subscribe(TOPIC_PRODUCT_CREATED).await.unwrap());

        let publisher = ProductEventPublisher::new(broker);
        let err = publisher.publish_created(&product()).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::ProjectionPublishFailed { .. }
        ));
    }
}

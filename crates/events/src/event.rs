//! The product lifecycle event union and topic routing.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::snapshot::{ProductPatch, ProductSnapshot};

/// Topic carrying `Created` events.
pub const TOPIC_PRODUCT_CREATED: &str = "product-created";

/// Topic carrying `Updated` events.
pub const TOPIC_PRODUCT_UPDATED: &str = "product-updated";

/// Topic carrying `Deleted` events.
pub const TOPIC_PRODUCT_DELETED: &str = "product-deleted";

/// All topics the search consumer subscribes to.
pub const TOPICS: [&str; 3] = [
    TOPIC_PRODUCT_CREATED,
    TOPIC_PRODUCT_UPDATED,
    TOPIC_PRODUCT_DELETED,
];

/// Payload of a `Deleted` event. Carries only the id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductDeletedData {
    pub id: ProductId,
}

/// A product lifecycle event as it travels over the broker.
///
/// Events are immutable once published. `Created` carries a full
/// snapshot, `Updated` a (possibly partial) patch, `Deleted` only the
/// id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ProductEvent {
    /// Product was created in the catalog.
    Created(ProductSnapshot),

    /// Product fields were changed in the catalog.
    Updated(ProductPatch),

    /// Product was removed from the catalog.
    Deleted(ProductDeletedData),
}

impl ProductEvent {
    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::Created(_) => "ProductCreated",
            ProductEvent::Updated(_) => "ProductUpdated",
            ProductEvent::Deleted(_) => "ProductDeleted",
        }
    }

    /// Returns the broker topic this event is published on.
    pub fn topic(&self) -> &'static str {
        match self {
            ProductEvent::Created(_) => TOPIC_PRODUCT_CREATED,
            ProductEvent::Updated(_) => TOPIC_PRODUCT_UPDATED,
            ProductEvent::Deleted(_) => TOPIC_PRODUCT_DELETED,
        }
    }

    /// Returns the product id, used as the partition/routing key so
    /// per-id delivery order is preserved within a partition.
    pub fn product_id(&self) -> ProductId {
        match self {
            ProductEvent::Created(snapshot) => snapshot.id,
            ProductEvent::Updated(patch) => patch.id,
            ProductEvent::Deleted(data) => data.id,
        }
    }

    /// The logical timestamp used for last-writer-wins comparison.
    ///
    /// `Deleted` carries no timestamp on the wire; its logical time is
    /// assigned by the consumer when the tombstone is recorded.
    pub fn updated_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        match self {
            ProductEvent::Created(snapshot) => Some(snapshot.updated_at),
            ProductEvent::Updated(patch) => Some(patch.updated_at),
            ProductEvent::Deleted(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::UserId;

    fn snapshot(id: ProductId) -> ProductSnapshot {
        ProductSnapshot {
            id,
            name: "Desk Lamp".to_string(),
            price_cents: 3_500,
            stock: 12,
            tags: vec!["lighting".to_string()],
            category: None,
            description: None,
            user_id: UserId::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn topic_routing() {
        let id = ProductId::new();
        assert_eq!(
            ProductEvent::Created(snapshot(id)).topic(),
            TOPIC_PRODUCT_CREATED
        );
        assert_eq!(
            ProductEvent::Updated(ProductPatch::from_snapshot(&snapshot(id))).topic(),
            TOPIC_PRODUCT_UPDATED
        );
        assert_eq!(
            ProductEvent::Deleted(ProductDeletedData { id }).topic(),
            TOPIC_PRODUCT_DELETED
        );
    }

    #[test]
    fn routing_key_is_product_id() {
        let id = ProductId::new();
        assert_eq!(ProductEvent::Deleted(ProductDeletedData { id }).product_id(), id);
        assert_eq!(ProductEvent::Created(snapshot(id)).product_id(), id);
    }

    #[test]
    fn tagged_union_wire_shape() {
        let id = ProductId::new();
        let json = serde_json::to_value(ProductEvent::Deleted(ProductDeletedData { id })).unwrap();
        assert_eq!(json["type"], "Deleted");
        assert_eq!(json["data"]["id"], serde_json::json!(id.as_uuid()));
    }

    #[test]
    fn event_roundtrip() {
        let event = ProductEvent::Created(snapshot(ProductId::new()));
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: ProductEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn deleted_has_no_wire_timestamp() {
        let event = ProductEvent::Deleted(ProductDeletedData {
            id: ProductId::new(),
        });
        assert!(event.updated_at().is_none());
    }
}

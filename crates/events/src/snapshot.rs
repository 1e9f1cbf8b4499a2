//! Product state payloads carried by lifecycle events.

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::{EventError, Result};

/// Full product state as published on `product-created`.
///
/// Every projected field is required on decode except `category` and
/// `description`, which are genuinely optional in the data model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Product identifier, also the partition/routing key.
    pub id: ProductId,

    /// Display name, 2..=100 characters.
    pub name: String,

    /// Price in minor currency units (cents), never negative.
    pub price_cents: i64,

    /// Units in stock.
    pub stock: u32,

    /// Ordered tag list, 1..=5 entries. Duplicates are allowed.
    pub tags: Vec<String>,

    /// Optional category for equality filtering.
    #[serde(default)]
    pub category: Option<String>,

    /// Optional free-text description.
    #[serde(default)]
    pub description: Option<String>,

    /// Owner of the product.
    pub user_id: UserId,

    /// Creation time, immutable after the first event.
    pub created_at: DateTime<Utc>,

    /// Last mutation time. Drives last-writer-wins on the read side.
    pub updated_at: DateTime<Utc>,
}

fn check_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if name.trim().is_empty() || len < 2 || len > 100 {
        return Err(EventError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn check_tags(tags: &[String]) -> Result<()> {
    if tags.is_empty() || tags.len() > 5 {
        return Err(EventError::InvalidTagCount(tags.len()));
    }
    Ok(())
}

fn check_price(price_cents: i64) -> Result<()> {
    if price_cents < 0 {
        return Err(EventError::NegativePrice(price_cents));
    }
    Ok(())
}

impl ProductSnapshot {
    /// Validates the projected field rules.
    ///
    /// The consumer rejects invalid snapshots instead of writing a
    /// corrupt row into the read model.
    pub fn validate(&self) -> Result<()> {
        check_name(&self.name)?;
        check_tags(&self.tags)?;
        check_price(self.price_cents)?;
        if self.updated_at < self.created_at {
            return Err(EventError::TimestampOrder {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }
}

/// Partial product state as published on `product-updated`.
///
/// `id` and `updated_at` are always required; every other field is
/// optional. `None` means "not carried by this event", never "set to
/// null" — the consumer preserves the stored value for absent fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub id: ProductId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Timestamp of the mutation this patch describes.
    pub updated_at: DateTime<Utc>,
}

impl ProductPatch {
    /// Validates the fields the patch carries.
    ///
    /// Absent fields are fine; a carried field must satisfy the same
    /// rules as on a snapshot, so merging a valid patch into a valid
    /// row can never produce an invalid one.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.name {
            check_name(name)?;
        }
        if let Some(ref tags) = self.tags {
            check_tags(tags)?;
        }
        if let Some(price_cents) = self.price_cents {
            check_price(price_cents)?;
        }
        if let Some(created_at) = self.created_at {
            if self.updated_at < created_at {
                return Err(EventError::TimestampOrder {
                    created_at,
                    updated_at: self.updated_at,
                });
            }
        }
        Ok(())
    }

    /// Builds a patch carrying the full state of a snapshot.
    pub fn from_snapshot(snapshot: &ProductSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: Some(snapshot.name.clone()),
            price_cents: Some(snapshot.price_cents),
            stock: Some(snapshot.stock),
            tags: Some(snapshot.tags.clone()),
            category: snapshot.category.clone(),
            description: snapshot.description.clone(),
            user_id: Some(snapshot.user_id),
            created_at: Some(snapshot.created_at),
            updated_at: snapshot.updated_at,
        }
    }

    /// Converts the patch into a full snapshot if it carries every
    /// required field. Used to seed a row when an `Updated` event
    /// arrives before its `Created`.
    pub fn full_snapshot(&self) -> Option<ProductSnapshot> {
        Some(ProductSnapshot {
            id: self.id,
            name: self.name.clone()?,
            price_cents: self.price_cents?,
            stock: self.stock?,
            tags: self.tags.clone()?,
            category: self.category.clone(),
            description: self.description.clone(),
            user_id: self.user_id?,
            created_at: self.created_at?,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(),
            name: "Mechanical Keyboard".to_string(),
            price_cents: 12_900,
            stock: 40,
            tags: vec!["peripherals".to_string(), "keyboards".to_string()],
            category: Some("electronics".to_string()),
            description: Some("Hot-swappable switches".to_string()),
            user_id: UserId::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn valid_snapshot_passes() {
        snapshot().validate().unwrap();
    }

    #[test]
    fn blank_name_rejected() {
        let mut s = snapshot();
        s.name = "   ".to_string();
        assert!(matches!(s.validate(), Err(EventError::InvalidName(_))));
    }

    #[test]
    fn single_char_name_rejected() {
        let mut s = snapshot();
        s.name = "x".to_string();
        assert!(matches!(s.validate(), Err(EventError::InvalidName(_))));
    }

    #[test]
    fn empty_tags_rejected() {
        let mut s = snapshot();
        s.tags.clear();
        assert!(matches!(s.validate(), Err(EventError::InvalidTagCount(0))));
    }

    #[test]
    fn six_tags_rejected() {
        let mut s = snapshot();
        s.tags = (0..6).map(|i| format!("tag{i}")).collect();
        assert!(matches!(s.validate(), Err(EventError::InvalidTagCount(6))));
    }

    #[test]
    fn negative_price_rejected() {
        let mut s = snapshot();
        s.price_cents = -1;
        assert!(matches!(s.validate(), Err(EventError::NegativePrice(-1))));
    }

    #[test]
    fn updated_before_created_rejected() {
        let mut s = snapshot();
        s.updated_at = s.created_at - chrono::Duration::seconds(1);
        assert!(matches!(
            s.validate(),
            Err(EventError::TimestampOrder { .. })
        ));
    }

    #[test]
    fn missing_required_field_is_a_decode_error() {
        // No `name`: must fail instead of defaulting.
        let json = serde_json::json!({
            "id": uuid::Uuid::now_v7(),
            "price_cents": 100,
            "stock": 1,
            "tags": ["a"],
            "user_id": uuid::Uuid::new_v4(),
            "created_at": Utc::now(),
            "updated_at": Utc::now(),
        });
        let result: std::result::Result<ProductSnapshot, _> = serde_json::from_value(json);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let mut json = serde_json::to_value(snapshot()).unwrap();
        json["warehouse_zone"] = serde_json::json!("B-12");
        let decoded: ProductSnapshot = serde_json::from_value(json).unwrap();
        decoded.validate().unwrap();
    }

    #[test]
    fn full_patch_roundtrips_through_snapshot() {
        let s = snapshot();
        let patch = ProductPatch::from_snapshot(&s);
        assert_eq!(patch.full_snapshot().unwrap(), s);
    }

    #[test]
    fn patch_with_absent_fields_passes() {
        let patch = ProductPatch {
            id: ProductId::new(),
            name: None,
            price_cents: None,
            stock: None,
            tags: None,
            category: None,
            description: None,
            user_id: None,
            created_at: None,
            updated_at: Utc::now(),
        };
        patch.validate().unwrap();
    }

    #[test]
    fn patch_with_negative_price_rejected() {
        let mut patch = ProductPatch::from_snapshot(&snapshot());
        patch.price_cents = Some(-500);
        assert!(matches!(
            patch.validate(),
            Err(EventError::NegativePrice(-500))
        ));
    }

    #[test]
    fn patch_with_six_tags_rejected() {
        let mut patch = ProductPatch::from_snapshot(&snapshot());
        patch.tags = Some((0..6).map(|i| format!("tag{i}")).collect());
        assert!(matches!(
            patch.validate(),
            Err(EventError::InvalidTagCount(6))
        ));
    }

    #[test]
    fn patch_with_blank_name_rejected() {
        let mut patch = ProductPatch::from_snapshot(&snapshot());
        patch.name = Some("  ".to_string());
        assert!(matches!(patch.validate(), Err(EventError::InvalidName(_))));
    }

    #[test]
    fn patch_updated_before_carried_created_rejected() {
        let mut patch = ProductPatch::from_snapshot(&snapshot());
        patch.updated_at = patch.created_at.unwrap() - chrono::Duration::seconds(1);
        assert!(matches!(
            patch.validate(),
            Err(EventError::TimestampOrder { .. })
        ));
    }

    #[test]
    fn partial_patch_has_no_full_snapshot() {
        let patch = ProductPatch {
            id: ProductId::new(),
            name: None,
            price_cents: Some(900),
            stock: None,
            tags: None,
            category: None,
            description: None,
            user_id: None,
            created_at: None,
            updated_at: Utc::now(),
        };
        assert!(patch.full_snapshot().is_none());
    }
}

//! The denormalized read-model row.

use chrono::{DateTime, Utc};
use common::{ProductId, UserId};
use events::{ProductPatch, ProductSnapshot};
use serde::{Deserialize, Serialize};

/// Delimiter used to flatten the tag list into one column.
const TAG_DELIMITER: char = ',';

/// Joins tags into the stored column representation.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(&TAG_DELIMITER.to_string())
}

/// Splits a stored tag column back into the ordered list.
pub fn split_tags(column: &str) -> Vec<String> {
    column
        .split(TAG_DELIMITER)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// One projected product row, keyed by id.
///
/// The row has no identity of its own: it must always be derivable by
/// replaying the event stream from empty state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    pub price_cents: i64,
    pub stock: u32,
    /// Tags flattened to a delimited string for storage.
    pub tags: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    /// Builds a row from a full snapshot.
    pub fn from_snapshot(snapshot: &ProductSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name.clone(),
            price_cents: snapshot.price_cents,
            stock: snapshot.stock,
            tags: join_tags(&snapshot.tags),
            category: snapshot.category.clone(),
            description: snapshot.description.clone(),
            user_id: snapshot.user_id,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        }
    }

    /// Merges a patch into this row: fields the patch does not carry
    /// keep their stored values. `created_at` is never overwritten.
    pub fn merge(&self, patch: &ProductPatch) -> Self {
        Self {
            id: self.id,
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            price_cents: patch.price_cents.unwrap_or(self.price_cents),
            stock: patch.stock.unwrap_or(self.stock),
            tags: patch
                .tags
                .as_deref()
                .map(join_tags)
                .unwrap_or_else(|| self.tags.clone()),
            category: patch.category.clone().or_else(|| self.category.clone()),
            description: patch
                .description
                .clone()
                .or_else(|| self.description.clone()),
            user_id: patch.user_id.unwrap_or(self.user_id),
            created_at: self.created_at,
            updated_at: patch.updated_at,
        }
    }

    /// The ordered tag list.
    pub fn tag_list(&self) -> Vec<String> {
        split_tags(&self.tags)
    }
}

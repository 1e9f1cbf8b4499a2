//! Tombstone registry for delete-vs-late-upsert races.
//!
//! True delivery order cannot be guaranteed across partitions, so a
//! deletion is remembered with its own logical timestamp for a bounded
//! grace period. A late-arriving Created/Updated whose `updated_at`
//! does not exceed the tombstone time is rejected instead of
//! resurrecting the deleted row.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use common::ProductId;

/// Remembers recent deletions per product id.
#[derive(Debug)]
pub struct TombstoneRegistry {
    entries: HashMap<ProductId, DateTime<Utc>>,
    grace: Duration,
}

impl TombstoneRegistry {
    /// Creates a registry holding tombstones for `grace` after the
    /// delete was observed.
    pub fn new(grace: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            grace,
        }
    }

    /// Records a deletion observed at `deleted_at`. A later deletion
    /// for the same id extends the tombstone.
    pub fn record(&mut self, id: ProductId, deleted_at: DateTime<Utc>) {
        let entry = self.entries.entry(id).or_insert(deleted_at);
        if deleted_at > *entry {
            *entry = deleted_at;
        }
    }

    /// Whether an upsert carrying `updated_at` for this id must be
    /// rejected. The delete wins over anything equal-or-older.
    pub fn blocks(&self, id: ProductId, updated_at: DateTime<Utc>) -> bool {
        match self.entries.get(&id) {
            Some(deleted_at) => updated_at <= *deleted_at,
            None => false,
        }
    }

    /// Drops tombstones older than the grace period.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) {
        let grace = self.grace;
        self.entries.retain(|_, deleted_at| now - *deleted_at <= grace);
    }

    /// Number of live tombstones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no tombstones are held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_equal_or_older_timestamps() {
        let mut registry = TombstoneRegistry::new(Duration::seconds(300));
        let id = ProductId::new();
        let deleted_at = Utc::now();
        registry.record(id, deleted_at);

        assert!(registry.blocks(id, deleted_at));
        assert!(registry.blocks(id, deleted_at - Duration::seconds(10)));
        assert!(!registry.blocks(id, deleted_at + Duration::seconds(1)));
    }

    #[test]
    fn unknown_id_is_not_blocked() {
        let registry = TombstoneRegistry::new(Duration::seconds(300));
        assert!(!registry.blocks(ProductId::new(), Utc::now()));
    }

    #[test]
    fn later_delete_extends_the_tombstone() {
        let mut registry = TombstoneRegistry::new(Duration::seconds(300));
        let id = ProductId::new();
        let first = Utc::now();
        let second = first + Duration::seconds(30);

        registry.record(id, second);
        registry.record(id, first); // older record must not rewind

        assert!(registry.blocks(id, first + Duration::seconds(10)));
        assert!(!registry.blocks(id, second + Duration::seconds(1)));
    }

    #[test]
    fn purge_drops_expired_entries_only() {
        let mut registry = TombstoneRegistry::new(Duration::seconds(60));
        let old = ProductId::new();
        let fresh = ProductId::new();
        let now = Utc::now();

        registry.record(old, now - Duration::seconds(120));
        registry.record(fresh, now - Duration::seconds(10));
        registry.purge_expired(now);

        assert_eq!(registry.len(), 1);
        assert!(!registry.blocks(old, now - Duration::seconds(130)));
        assert!(registry.blocks(fresh, now - Duration::seconds(20)));
    }
}

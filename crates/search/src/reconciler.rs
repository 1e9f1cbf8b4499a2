//! The read-model reconciler.
//!
//! Converts one inbound event plus the current row state into a
//! concrete store mutation. The broker guarantees neither single
//! delivery nor cross-partition ordering, so correctness rests entirely
//! on the discipline here:
//! - last-writer-wins: an incoming snapshot or patch is applied only if
//!   its `updated_at` is strictly newer than the stored row's
//! - merge, not overwrite: fields a patch does not carry keep their
//!   stored values
//! - deletes win over equal-or-older upserts and leave a tombstone for
//!   a grace period so a late stale event cannot resurrect the row
//! - store failures are retried with bounded backoff, then parked in
//!   the dead-letter queue

use std::time::Duration;

use chrono::Utc;
use common::ProductId;
use events::{ProductEvent, ProductPatch, ProductSnapshot};
use tokio::sync::RwLock;

use crate::config::SearchConfig;
use crate::dead_letter::DeadLetterQueue;
use crate::error::{Result, SearchError};
use crate::row::ProductRow;
use crate::store::ReadStore;
use crate::tombstone::TombstoneRegistry;

/// The store mutation chosen for one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Insert a new row for an id with no current row.
    Insert(ProductRow),
    /// Replace/merge the current row with newer data.
    Merge(ProductRow),
    /// Remove the row.
    Delete(ProductId),
    /// Do nothing; the event is a no-op for the projection.
    Discard(DiscardReason),
}

/// Why an event was discarded. A discard is a normal outcome, not an
/// error, but it is counted for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The event's `updated_at` is not newer than the stored row's.
    Stale,
    /// A tombstone for this id blocks the event.
    Tombstoned,
    /// A partial patch arrived for an id with no row; there is not
    /// enough data to seed one.
    IncompletePatch,
    /// The payload decoded but failed field validation.
    Invalid,
}

impl DiscardReason {
    fn as_label(&self) -> &'static str {
        match self {
            DiscardReason::Stale => "stale",
            DiscardReason::Tombstoned => "tombstoned",
            DiscardReason::IncompletePatch => "incomplete_patch",
            DiscardReason::Invalid => "invalid",
        }
    }
}

/// Final outcome of processing one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The store was mutated.
    Applied,
    /// The event was a deliberate no-op.
    Discarded(DiscardReason),
    /// Retries were exhausted; the event is parked for replay.
    DeadLettered,
}

/// Bounded retry with exponential backoff for store errors.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before the given 1-based retry attempt, doubling each
    /// time.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
        }
    }
}

/// Decides how a `Created` event maps onto the current row state.
pub fn decide_created(snapshot: &ProductSnapshot, current: Option<&ProductRow>) -> Decision {
    match current {
        None => Decision::Insert(ProductRow::from_snapshot(snapshot)),
        Some(row) if snapshot.updated_at > row.updated_at => {
            Decision::Merge(ProductRow::from_snapshot(snapshot))
        }
        Some(_) => Decision::Discard(DiscardReason::Stale),
    }
}

/// Decides how an `Updated` event maps onto the current row state.
///
/// Callers validate the patch fields first; merging a valid patch into
/// a valid row cannot produce an invalid one.
pub fn decide_updated(patch: &ProductPatch, current: Option<&ProductRow>) -> Decision {
    match current {
        Some(row) if patch.updated_at > row.updated_at => Decision::Merge(row.merge(patch)),
        Some(_) => Decision::Discard(DiscardReason::Stale),
        None => match patch.full_snapshot() {
            // The Updated overtook its Created; a complete patch can
            // seed the row and the late Created will be discarded as
            // stale.
            Some(snapshot) => Decision::Insert(ProductRow::from_snapshot(&snapshot)),
            None => Decision::Discard(DiscardReason::IncompletePatch),
        },
    }
}

/// Applies events to the read store with idempotency and ordering
/// guarantees.
pub struct Reconciler<S: ReadStore> {
    store: S,
    tombstones: RwLock<TombstoneRegistry>,
    dead_letters: DeadLetterQueue,
    retry: RetryPolicy,
}

impl<S: ReadStore> Reconciler<S> {
    /// Creates a reconciler over the given store.
    pub fn new(store: S, config: &SearchConfig) -> Self {
        Self {
            store,
            tombstones: RwLock::new(TombstoneRegistry::new(config.tombstone_grace)),
            dead_letters: DeadLetterQueue::new(),
            retry: RetryPolicy {
                max_attempts: config.retry_max_attempts,
                base_delay: config.retry_base_delay,
            },
        }
    }

    /// The dead-letter queue holding events that exhausted retries.
    pub fn dead_letters(&self) -> &DeadLetterQueue {
        &self.dead_letters
    }

    /// The underlying read store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Processes one decoded event to completion.
    #[tracing::instrument(skip(self, event), fields(event_type = event.event_type(), product_id = %event.product_id()))]
    pub async fn process(&self, event: ProductEvent) -> Outcome {
        self.tombstones.write().await.purge_expired(Utc::now());

        let outcome = match &event {
            ProductEvent::Created(snapshot) => {
                if let Err(error) = snapshot.validate() {
                    tracing::warn!(%error, "invalid snapshot, dropping event");
                    self.discarded(DiscardReason::Invalid)
                } else if self.blocked(snapshot.id, snapshot.updated_at).await {
                    self.discarded(DiscardReason::Tombstoned)
                } else {
                    let snapshot = snapshot.clone();
                    self.apply_upsert(snapshot.id, &event, move |current| {
                        decide_created(&snapshot, current)
                    })
                    .await
                }
            }
            ProductEvent::Updated(patch) => {
                if let Err(error) = patch.validate() {
                    tracing::warn!(%error, "invalid patch, dropping event");
                    self.discarded(DiscardReason::Invalid)
                } else if self.blocked(patch.id, patch.updated_at).await {
                    self.discarded(DiscardReason::Tombstoned)
                } else {
                    let patch = patch.clone();
                    self.apply_upsert(patch.id, &event, move |current| {
                        decide_updated(&patch, current)
                    })
                    .await
                }
            }
            ProductEvent::Deleted(data) => {
                // The delete's logical time is assigned here, when the
                // tombstone is recorded.
                self.tombstones.write().await.record(data.id, Utc::now());
                self.apply_delete(data.id, &event).await
            }
        };

        if outcome == Outcome::Applied {
            metrics::counter!("reconciler_events_applied", "event_type" => event.event_type())
                .increment(1);
        }
        outcome
    }

    async fn blocked(&self, id: ProductId, updated_at: chrono::DateTime<Utc>) -> bool {
        self.tombstones.read().await.blocks(id, updated_at)
    }

    fn discarded(&self, reason: DiscardReason) -> Outcome {
        metrics::counter!("reconciler_events_discarded", "reason" => reason.as_label())
            .increment(1);
        tracing::debug!(reason = reason.as_label(), "event discarded");
        Outcome::Discarded(reason)
    }

    /// Re-reads current state and applies the decision, retrying the
    /// whole read-decide-write sequence on store errors. The re-read on
    /// every attempt matters: the atomic upsert alone cannot express
    /// "only if newer".
    async fn apply_upsert<F>(&self, id: ProductId, event: &ProductEvent, decide: F) -> Outcome
    where
        F: Fn(Option<&ProductRow>) -> Decision,
    {
        let mut last_error: Option<SearchError> = None;

        for attempt in 1..=self.retry.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.retry.delay_for(attempt - 1)).await;
            }

            match self.try_upsert(id, &decide).await {
                Ok(outcome) => return outcome,
                Err(error) if error.is_retryable() => {
                    tracing::warn!(attempt, %error, "store operation failed, will retry");
                    last_error = Some(error);
                }
                Err(error) => {
                    // Non-retryable store state; park immediately.
                    self.dead_letters
                        .park(event.clone(), error.to_string(), attempt)
                        .await;
                    return Outcome::DeadLettered;
                }
            }
        }

        let error = last_error.map(|e| e.to_string()).unwrap_or_default();
        self.dead_letters
            .park(event.clone(), error, self.retry.max_attempts)
            .await;
        Outcome::DeadLettered
    }

    async fn try_upsert<F>(&self, id: ProductId, decide: &F) -> Result<Outcome>
    where
        F: Fn(Option<&ProductRow>) -> Decision,
    {
        let current = self.store.find_by_id(id).await?;
        match decide(current.as_ref()) {
            Decision::Insert(row) | Decision::Merge(row) => {
                self.store.upsert(&row).await?;
                Ok(Outcome::Applied)
            }
            Decision::Delete(id) => {
                self.store.delete_by_id(id).await?;
                Ok(Outcome::Applied)
            }
            Decision::Discard(reason) => Ok(self.discarded(reason)),
        }
    }

    async fn apply_delete(&self, id: ProductId, event: &ProductEvent) -> Outcome {
        let mut last_error: Option<SearchError> = None;

        for attempt in 1..=self.retry.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.retry.delay_for(attempt - 1)).await;
            }

            match self.store.delete_by_id(id).await {
                // Deleting an absent row is the Absent -> Absent
                // transition, still a successful apply.
                Ok(()) => return Outcome::Applied,
                Err(error) if error.is_retryable() => {
                    tracing::warn!(attempt, %error, "delete failed, will retry");
                    last_error = Some(error);
                }
                Err(error) => {
                    self.dead_letters
                        .park(event.clone(), error.to_string(), attempt)
                        .await;
                    return Outcome::DeadLettered;
                }
            }
        }

        let error = last_error.map(|e| e.to_string()).unwrap_or_default();
        self.dead_letters
            .park(event.clone(), error, self.retry.max_attempts)
            .await;
        Outcome::DeadLettered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use common::UserId;

    fn snapshot(id: ProductId, price_cents: i64, offset_secs: i64) -> ProductSnapshot {
        let base = Utc::now() - ChronoDuration::hours(1);
        ProductSnapshot {
            id,
            name: "Test Product".to_string(),
            price_cents,
            stock: 5,
            tags: vec!["test".to_string()],
            category: None,
            description: None,
            user_id: UserId::new(),
            created_at: base,
            updated_at: base + ChronoDuration::seconds(offset_secs),
        }
    }

    #[test]
    fn created_inserts_when_absent() {
        let s = snapshot(ProductId::new(), 1_000, 0);
        assert!(matches!(decide_created(&s, None), Decision::Insert(_)));
    }

    #[test]
    fn created_discards_equal_timestamp() {
        let s = snapshot(ProductId::new(), 1_000, 0);
        let row = ProductRow::from_snapshot(&s);
        assert_eq!(
            decide_created(&s, Some(&row)),
            Decision::Discard(DiscardReason::Stale)
        );
    }

    #[test]
    fn created_overwrites_older_row() {
        let id = ProductId::new();
        let older = ProductRow::from_snapshot(&snapshot(id, 1_000, 0));
        let newer = snapshot(id, 900, 10);
        match decide_created(&newer, Some(&older)) {
            Decision::Merge(row) => assert_eq!(row.price_cents, 900),
            other => panic!("unexpected decision: {other:?}"),
        }
    }

    #[test]
    fn updated_merges_newer_patch() {
        let id = ProductId::new();
        let row = ProductRow::from_snapshot(&snapshot(id, 1_000, 0));
        let patch = ProductPatch {
            id,
            name: None,
            price_cents: Some(900),
            stock: None,
            tags: None,
            category: None,
            description: None,
            user_id: None,
            created_at: None,
            updated_at: row.updated_at + ChronoDuration::seconds(1),
        };
        match decide_updated(&patch, Some(&row)) {
            Decision::Merge(merged) => {
                assert_eq!(merged.price_cents, 900);
                assert_eq!(merged.name, row.name);
            }
            other => panic!("unexpected decision: {other:?}"),
        }
    }

    #[test]
    fn updated_discards_older_patch() {
        let id = ProductId::new();
        let row = ProductRow::from_snapshot(&snapshot(id, 1_000, 10));
        let patch = ProductPatch {
            id,
            name: None,
            price_cents: Some(900),
            stock: None,
            tags: None,
            category: None,
            description: None,
            user_id: None,
            created_at: None,
            updated_at: row.updated_at - ChronoDuration::seconds(5),
        };
        assert_eq!(
            decide_updated(&patch, Some(&row)),
            Decision::Discard(DiscardReason::Stale)
        );
    }

    #[test]
    fn complete_patch_seeds_absent_row() {
        let s = snapshot(ProductId::new(), 1_000, 0);
        let patch = ProductPatch::from_snapshot(&s);
        assert!(matches!(decide_updated(&patch, None), Decision::Insert(_)));
    }

    #[test]
    fn partial_patch_for_absent_row_is_discarded() {
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
        assert_eq!(
            decide_updated(&patch, None),
            Decision::Discard(DiscardReason::IncompletePatch)
        );
    }

    #[test]
    fn retry_policy_doubles_delay() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(50),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(50));
        assert_eq!(policy.delay_for(2), Duration::from_millis(100));
        assert_eq!(policy.delay_for(3), Duration::from_millis(200));
    }
}

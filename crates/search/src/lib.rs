//! Read-side search service.
//!
//! Consumes product lifecycle events and maintains the denormalized
//! read model:
//! - [`ProductRow`] — the projected row, tags flattened for storage
//! - [`ReadStore`] — relational store port ([`InMemoryReadStore`],
//!   [`PostgresReadStore`])
//! - [`Reconciler`] — turns one event plus current row state into an
//!   idempotent store mutation (last-writer-wins, tombstones, bounded
//!   retry, dead-letter parking)
//! - [`EventConsumer`] — per-topic workers feeding the reconciler
//!
//! The broker guarantees nothing about cross-partition ordering or
//! single delivery; every correctness property lives in the reconciler.

pub mod config;
pub mod consumer;
pub mod dead_letter;
pub mod error;
pub mod reconciler;
pub mod row;
pub mod store;
pub mod tombstone;

pub use config::SearchConfig;
pub use consumer::EventConsumer;
pub use dead_letter::{DeadLetter, DeadLetterQueue};
pub use error::{Result, SearchError};
pub use reconciler::{Decision, DiscardReason, Outcome, Reconciler, RetryPolicy};
pub use row::ProductRow;
pub use store::{InMemoryReadStore, PostgresReadStore, ProductQuery, ReadStore};
pub use tombstone::TombstoneRegistry;

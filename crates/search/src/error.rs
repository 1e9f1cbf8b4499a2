//! Search-side error types.

use thiserror::Error;

/// Errors that can occur on the read side of the pipeline.
#[derive(Debug, Error)]
pub enum SearchError {
    /// An inbound event payload could not be decoded. The message is
    /// dropped, not retried: a structurally invalid event can never
    /// become valid.
    #[error("Event deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// An inbound event decoded but failed field validation.
    #[error("Event validation error: {0}")]
    Validation(#[from] events::EventError),

    /// A read-store statement failed. Retried with bounded backoff.
    #[error("Read store error: {0}")]
    Database(#[from] sqlx::Error),

    /// Injected or transient store unavailability.
    #[error("Read store unavailable: {0}")]
    StoreUnavailable(String),

    /// The broker subscription failed.
    #[error("Broker error: {0}")]
    Broker(#[from] broker::BrokerError),
}

impl SearchError {
    /// Whether retrying the same operation can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SearchError::Database(_) | SearchError::StoreUnavailable(_)
        )
    }
}

/// Result type for search-side operations.
pub type Result<T> = std::result::Result<T, SearchError>;

//! Event schema error types.

use thiserror::Error;

/// Errors raised while decoding or validating an event payload.
#[derive(Debug, Error)]
pub enum EventError {
    /// The payload could not be decoded at all.
    #[error("Event deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// Product name is outside the 2..=100 character range or blank.
    #[error("Invalid product name: {0:?}")]
    InvalidName(String),

    /// Tag list is empty or carries more than 5 entries.
    #[error("Invalid tag count: {0} (expected 1..=5)")]
    InvalidTagCount(usize),

    /// Price in minor currency units must never be negative.
    #[error("Negative price: {0}")]
    NegativePrice(i64),

    /// `updated_at` precedes `created_at`.
    #[error("updated_at {updated_at} precedes created_at {created_at}")]
    TimestampOrder {
        created_at: chrono::DateTime<chrono::Utc>,
        updated_at: chrono::DateTime<chrono::Utc>,
    },
}

/// Result type for event schema operations.
pub type Result<T> = std::result::Result<T, EventError>;

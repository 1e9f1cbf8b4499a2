//! Broker error types.

use thiserror::Error;

/// Errors that can occur when talking to the broker.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The publish could not be handed to the broker.
    #[error("Publish to topic '{topic}' failed: {reason}")]
    PublishFailed { topic: String, reason: String },

    /// The subscription could not be established.
    #[error("Subscribe to topic '{topic}' failed: {reason}")]
    SubscribeFailed { topic: String, reason: String },
}

/// Result type for broker operations.
pub type Result<T> = std::result::Result<T, BrokerError>;

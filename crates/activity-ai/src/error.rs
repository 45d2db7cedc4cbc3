//! Error types for summarization.

use thiserror::Error;

/// Errors that can occur while summarizing an activity.
#[derive(Debug, Error)]
pub enum AiError {
    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The gateway could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The gateway answered with a non-success status.
    #[error("gateway error ({status}): {message}")]
    Gateway { status: u16, message: String },

    /// The reply held no usable JSON summary.
    #[error("unusable reply: {0}")]
    InvalidReply(String),
}

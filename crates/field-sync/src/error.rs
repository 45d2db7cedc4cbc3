//! Error types for field-sync.

use thiserror::Error;

/// Errors from the wizard, the queue file and the sync client.
#[derive(Debug, Error)]
pub enum SyncError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Queue file could not be read or written.
    #[error("queue file error: {0}")]
    Io(#[from] std::io::Error),

    /// The server rejected the bearer token.
    #[error("not signed in")]
    Unauthorized,

    /// The server already holds this entry.
    #[error("entry already exists: {0}")]
    Duplicate(String),

    /// The server answered with an error status.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A flush is already running.
    #[error("a sync is already in progress")]
    AlreadySyncing,

    /// The wizard cannot do what was asked in its current state.
    #[error("{0}")]
    Incomplete(String),

    /// Coordinates outside lat [-90, 90] / lng [-180, 180].
    #[error("invalid location: {lat}, {lng}")]
    InvalidLocation { lat: f64, lng: f64 },
}

//! Error types for mws-core

use thiserror::Error;

/// Result type alias using mws-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in mws-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// The network could not be reached (connection refused, DNS, timeout)
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Neither the network nor the local mirror could answer
    #[error("Not found: {0}")]
    NotFound(String),

    /// Underlying persistent medium failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Migrations could not be applied
    #[error("Schema error: {0}")]
    Schema(String),

    /// A queued mutation failed again on replay
    #[error("Replay of request {local_id} failed: {reason}")]
    Replay { local_id: i64, reason: String },

    /// The API answered with a non-success status
    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Lifecycle event not valid in the current state
    #[error("Invalid lifecycle transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },
}

impl Error {
    /// Whether this error originates in the persistent medium.
    ///
    /// These have no fallback below the store and are always propagated.
    pub const fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::LibSql(_) | Self::Io(_) | Self::Serialization(_)
        )
    }
}

//! Session error types

use thiserror::Error;

/// Failures of the page session or semantic resolver collaborators
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("failed to spawn driver '{command}': {message}")]
    Spawn { command: String, message: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    /// The driver answered the request with an error
    #[error("{0}")]
    Driver(String),

    #[error("driver did not answer within {0}ms")]
    Timeout(u64),

    #[error("driver session closed")]
    Closed,
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Protocol(err.to_string())
    }
}

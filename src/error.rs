//! Error types for the relay.
//!
//! The ingestion path (append, query, notify) never fails; errors only
//! surface at the edges: configuration, socket binding and the HTTP client.

use std::io;
use thiserror::Error;

/// Errors that can occur in the relay
#[derive(Error, Debug)]
pub enum RelayError {
    /// I/O error (socket operations, stdin)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid configuration value
    #[error("invalid configuration {key}: {message}")]
    Config { key: String, message: String },

    /// Listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// HTTP client error (history viewer)
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Maximum subscribers reached
    #[error("maximum subscribers reached ({max})")]
    MaxSubscribers { max: usize },
}

impl RelayError {
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        RelayError::Config {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;

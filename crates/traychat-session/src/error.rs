//! Error types for the session crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by the chat-client collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The connection could not be established or was lost.
    #[error("connection error: {0}")]
    Connection(String),

    /// The service sent something the client could not handle.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The client was already shut down.
    #[error("client closed")]
    Closed,
}

/// Errors that can occur in the session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A connect or disconnect task completed with an error.
    #[error("chat client error: {0}")]
    Client(#[from] ClientError),

    /// The settings file could not be read or written.
    #[error("settings error at {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

//! Error types for authentication.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while authenticating.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The service rejected the credentials or the PIN.
    #[error("login failed: {0}")]
    InvalidCredentials(String),

    /// The user dismissed a prompt.
    #[error("authentication cancelled by user")]
    Cancelled,

    /// Nobody is answering prompts anymore.
    #[error("prompt channel closed")]
    PromptClosed,

    /// The cookie store could not be read or written.
    #[error("cookie store error at {path}: {source}")]
    CookieStore {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other failure reported by the authentication service.
    #[error("authentication service error: {0}")]
    Service(String),
}

impl AuthError {
    /// Returns true if the user aborted authentication.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AuthError::Cancelled)
    }
}

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

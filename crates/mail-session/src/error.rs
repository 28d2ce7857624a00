//! Error types for mail-session.

use thiserror::Error;

/// Errors that can occur while managing a mailbox session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// HTTP request failed before a reply arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Upstream replied with an error status.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// The domain listing was empty.
    #[error("No domains available")]
    NoDomains,

    /// Account creation failed.
    #[error("Failed to create account: {0}")]
    AccountCreation(String),

    /// The token reply carried no token.
    #[error("No token received")]
    MissingToken,

    /// An operation needed an active credential and there was none.
    #[error("No active mailbox")]
    NoCredential,

    /// Another credential acquisition is already running.
    #[error("A new address is already being created")]
    AcquireInProgress,

    /// Reading or writing the persisted credential failed.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SessionError {
    /// HTTP status of an upstream error reply, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            SessionError::Upstream { status, .. } => Some(*status),
            SessionError::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

//! Error types for the lobby client.

use thiserror::Error;

use crate::domain::{CommandError, SettingsError, ValueObjectError};

/// Client-facing errors.
///
/// Connection and protocol failures reach callers as lobby *state*; only
/// validation and command rejections are returned from command calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Transport unreachable or timed out after the reconnection budget
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Well-formed `error` event from the server
    #[error("Server error: {0}")]
    ProtocolError(String),

    /// Settings rejected client-side; never reaches the wire
    #[error("Invalid settings: {0}")]
    Validation(#[from] SettingsError),

    /// Command preconditions not met; never reaches the wire
    #[error("Command rejected: {0}")]
    CommandRejected(#[from] CommandError),

    /// Invalid identifier supplied by the caller
    #[error("Invalid value: {0}")]
    InvalidValue(#[from] ValueObjectError),

    /// Inbound payload missing required fields
    #[error("Malformed '{event}' event: {reason}")]
    MalformedEvent { event: String, reason: String },

    /// Outbound command could not be encoded
    #[error("Failed to encode '{event}': {reason}")]
    Encode { event: String, reason: String },

    /// Identity service reports no signed-in user
    #[error("Not signed in")]
    Unauthenticated,

    /// Identity service could not be reached or answered garbage
    #[error("Session lookup failed: {0}")]
    SessionLookup(String),
}

impl ClientError {
    pub(crate) fn malformed(event: &str, reason: impl ToString) -> Self {
        Self::MalformedEvent {
            event: event.to_string(),
            reason: reason.to_string(),
        }
    }
}

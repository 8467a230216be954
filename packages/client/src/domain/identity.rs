//! Caller identity and the service that resolves it.

use async_trait::async_trait;

use crate::error::ClientError;

use super::UserId;

/// Signed-in user. Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub name: String,
    /// Display image reference (URL)
    pub image: Option<String>,
    pub email_verified: bool,
}

/// Identity/session lookup consumed by the bootstrapper.
///
/// The infrastructure layer provides the HTTP implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Current identity, or `None` when nobody is signed in.
    async fn current_identity(&self) -> Result<Option<Identity>, ClientError>;
}

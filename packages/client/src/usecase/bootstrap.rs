//! UseCase: resolve the caller's identity before any channel is opened.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::{
    domain::{Identity, SessionProvider},
    error::ClientError,
};

/// Resolves the identity once and hands out the cached value afterwards.
pub struct SessionBootstrapper {
    provider: Arc<dyn SessionProvider>,
    identity: OnceCell<Identity>,
}

impl SessionBootstrapper {
    pub fn new(provider: Arc<dyn SessionProvider>) -> Self {
        Self {
            provider,
            identity: OnceCell::new(),
        }
    }

    /// Signed-in identity.
    ///
    /// # Returns
    ///
    /// * `Ok(Identity)` - resolved now or on an earlier call
    /// * `Err(ClientError::Unauthenticated)` - nobody is signed in
    /// * `Err(ClientError::SessionLookup)` - the service failed
    ///
    /// Failures are not cached; the next call asks the service again.
    pub async fn identity(&self) -> Result<&Identity, ClientError> {
        self.identity
            .get_or_try_init(|| async {
                let identity = self
                    .provider
                    .current_identity()
                    .await?
                    .ok_or(ClientError::Unauthenticated)?;
                tracing::info!("Signed in as '{}' ({})", identity.name, identity.id);
                Ok::<_, ClientError>(identity)
            })
            .await
    }
}

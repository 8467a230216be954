//! HTTP client for the identity/session service.

use async_trait::async_trait;
use reqwest::header::COOKIE;

use crate::{
    domain::{Identity, SessionProvider},
    error::ClientError,
};

use super::dto::session::SessionDto;

/// Session lookup path appended to the base URL.
pub const SESSION_PATH: &str = "/api/auth/get-session";

/// Looks the session up with `GET {base}/api/auth/get-session`.
#[derive(Debug, Clone)]
pub struct HttpSessionProvider {
    client: reqwest::Client,
    url: String,
    cookie: Option<String>,
}

impl HttpSessionProvider {
    pub fn new(base_url: &str, cookie: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: format!("{}{}", base_url.trim_end_matches('/'), SESSION_PATH),
            cookie,
        }
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn current_identity(&self) -> Result<Option<Identity>, ClientError> {
        let mut request = self.client.get(&self.url);
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| ClientError::SessionLookup(e.to_string()))?;
        // `null` body means signed out.
        let session: Option<SessionDto> = response
            .json()
            .await
            .map_err(|e| ClientError::SessionLookup(e.to_string()))?;

        match session.and_then(|s| s.user) {
            Some(user) => Identity::try_from(user).map(Some),
            None => Ok(None),
        }
    }
}

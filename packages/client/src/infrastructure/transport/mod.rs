//! Transport implementations behind a uniform [`Link`].
//!
//! ## Responsibilities
//!
//! - Resolve endpoint URLs from a base URL plus fixed path suffixes
//! - Establish a single connection of a given [`TransportKind`]
//! - Pump frames between the network and a pair of in-memory channels
//!
//! Reconnection and handler dispatch live one layer up, in `crate::channel`.

pub mod polling;
pub mod websocket;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::infrastructure::dto::event::Frame;

pub use polling::PollingConnector;
pub use websocket::WebSocketConnector;

/// Transport-level failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Base URL has an unsupported scheme
    #[error("invalid endpoint URL '{0}'")]
    InvalidUrl(String),

    /// Request could not be built (bad header value, ...)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Server refused or failed the handshake
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Read or write failure on an established link
    #[error("transport I/O error: {0}")]
    Io(String),

    /// Peer closed the link
    #[error("closed by peer: {0}")]
    Closed(String),
}

/// Kind of transport, attempted in the configured preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    WebSocket,
    Polling,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebSocket => f.write_str("websocket"),
            Self::Polling => f.write_str("polling"),
        }
    }
}

/// Everything a connector needs to reach one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    /// `http(s)://` or `ws(s)://` origin
    pub base_url: String,
    /// Handshake path plus namespace, e.g. `/realtime/lobby`
    pub path: String,
    /// Cookie header value attached to every request
    pub cookie: Option<String>,
}

impl ConnectRequest {
    /// URL for the WebSocket transport (`ws://` / `wss://`).
    pub fn websocket_url(&self) -> Result<String, TransportError> {
        let base = self.base_url.trim_end_matches('/');
        let origin = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else if base.starts_with("ws://") || base.starts_with("wss://") {
            base.to_string()
        } else {
            return Err(TransportError::InvalidUrl(self.base_url.clone()));
        };
        Ok(format!("{}{}", origin, self.path))
    }

    /// URL for the polling transport (`http://` / `https://`).
    pub fn polling_url(&self) -> Result<String, TransportError> {
        let base = self.base_url.trim_end_matches('/');
        let origin = if let Some(rest) = base.strip_prefix("wss://") {
            format!("https://{}", rest)
        } else if let Some(rest) = base.strip_prefix("ws://") {
            format!("http://{}", rest)
        } else if base.starts_with("http://") || base.starts_with("https://") {
            base.to_string()
        } else {
            return Err(TransportError::InvalidUrl(self.base_url.clone()));
        };
        Ok(format!("{}{}", origin, self.path))
    }
}

/// An established connection, as seen by the channel driver.
///
/// Dropping `outbound` asks the transport to shut down; the transport reports
/// the end of the link by sending an `Err` on, or closing, `inbound`.
#[derive(Debug)]
pub struct Link {
    pub outbound: mpsc::UnboundedSender<Frame>,
    pub inbound: mpsc::UnboundedReceiver<Result<Frame, TransportError>>,
}

/// Opens links of a given transport kind.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establish one connection. No retries happen at this level.
    async fn connect(
        &self,
        kind: TransportKind,
        request: &ConnectRequest,
    ) -> Result<Link, TransportError>;
}

/// Connector that dispatches to the WebSocket or polling implementation.
#[derive(Debug, Clone, Default)]
pub struct DefaultConnector {
    websocket: WebSocketConnector,
    polling: PollingConnector,
}

impl DefaultConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Connector for DefaultConnector {
    async fn connect(
        &self,
        kind: TransportKind,
        request: &ConnectRequest,
    ) -> Result<Link, TransportError> {
        match kind {
            TransportKind::WebSocket => self.websocket.connect(request).await,
            TransportKind::Polling => self.polling.connect(request).await,
        }
    }
}

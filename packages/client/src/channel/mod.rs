//! Realtime channels: one reconnecting event connection per feature area.
//!
//! ## Structure
//!
//! - [`TransportManager`]: owned registry guaranteeing one live channel per [`Feature`]
//! - [`Channel`]: cloneable handle (`on`, `on_any`, `send`, `listen`, `close`)
//! - [`ChannelEvent`] / [`OutboundCommand`]: typed protocol events
//!
//! Handlers run on the channel's driver task, one at a time and in the order
//! the server sent the events.

mod event;
mod handle;
mod manager;

#[cfg(test)]
pub(crate) mod testing;

use std::{fmt, time::Duration};

use uuid::Uuid;

use crate::{
    domain::{ReconnectPolicy, reconnect::DEFAULT_CONNECT_TIMEOUT},
    infrastructure::transport::{ConnectRequest, TransportKind},
};

pub use event::{ChannelEvent, EventKind, OutboundCommand};
pub use handle::Channel;
pub use manager::TransportManager;

/// Default handshake path appended to the base URL.
pub const DEFAULT_HANDSHAKE_PATH: &str = "/realtime";

/// Feature areas that own a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Lobby,
    Notifications,
}

impl Feature {
    /// Namespace sub-path of the feature's endpoint.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Lobby => "/lobby",
            Self::Notifications => "/notifications",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => f.write_str("lobby"),
            Self::Notifications => f.write_str("notifications"),
        }
    }
}

/// Stable identifier of one channel instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(Uuid);

impl ChannelId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a channel's underlying connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    /// Initial state; `open` only returns once a link is up
    Connected,
    Reconnecting,
    /// Reconnection budget exhausted
    Failed,
    /// Closed by its owner
    Closed,
}

impl ChannelStatus {
    /// A live channel may still deliver events.
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Failed | Self::Closed)
    }
}

/// Connection parameters of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Origin, e.g. `http://127.0.0.1:3000`
    pub base_url: String,
    /// Feature sub-path, e.g. `/lobby`
    pub namespace: String,
    /// Transport handshake path, e.g. `/realtime`
    pub handshake_path: String,
    /// Transports in preference order
    pub transports: Vec<TransportKind>,
    /// Ambient credentials; attached to every request when present
    pub cookie: Option<String>,
    /// Per-attempt connect timeout
    pub connect_timeout: Duration,
    pub reconnect: ReconnectPolicy,
}

impl ChannelConfig {
    /// Config with the default transports (WebSocket, then polling),
    /// 20 s connect timeout and 5 × 1 s reconnection policy.
    pub fn new(base_url: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            namespace: namespace.into(),
            handshake_path: DEFAULT_HANDSHAKE_PATH.to_string(),
            transports: vec![TransportKind::WebSocket, TransportKind::Polling],
            cookie: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// Config for a feature's standard namespace.
    pub fn for_feature(base_url: impl Into<String>, feature: Feature) -> Self {
        Self::new(base_url, feature.namespace())
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie;
        self
    }

    #[must_use]
    pub fn with_transports(mut self, transports: Vec<TransportKind>) -> Self {
        self.transports = transports;
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Request handed to connectors: `{base}{handshake_path}{namespace}`.
    pub fn connect_request(&self) -> ConnectRequest {
        ConnectRequest {
            base_url: self.base_url.clone(),
            path: format!("{}{}", self.handshake_path, self.namespace),
            cookie: self.cookie.clone(),
        }
    }
}

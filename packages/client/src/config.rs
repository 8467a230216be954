//! Client configuration assembled by the binary.

use std::time::Duration;

use crate::{
    channel::{ChannelConfig, Feature},
    domain::{ReconnectPolicy, Settings, reconnect::DEFAULT_CONNECT_TIMEOUT},
    infrastructure::transport::TransportKind,
    usecase::LobbyPolicy,
};

/// Everything `run_client` needs.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin of the game server, e.g. `http://127.0.0.1:3000`
    pub base_url: String,
    /// Session cookie sent with every request
    pub cookie: Option<String>,
    /// Question set used by `create`
    pub deck_id: String,
    pub settings: Settings,
    pub policy: LobbyPolicy,
    pub transports: Vec<TransportKind>,
    pub connect_timeout: Duration,
    pub reconnect: ReconnectPolicy,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, deck_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cookie: None,
            deck_id: deck_id.into(),
            settings: Settings::default(),
            policy: LobbyPolicy::default(),
            transports: vec![TransportKind::WebSocket, TransportKind::Polling],
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect: ReconnectPolicy::default(),
        }
    }

    pub fn lobby_channel(&self) -> ChannelConfig {
        self.channel(Feature::Lobby)
    }

    pub fn notification_channel(&self) -> ChannelConfig {
        self.channel(Feature::Notifications)
    }

    fn channel(&self, feature: Feature) -> ChannelConfig {
        ChannelConfig::for_feature(self.base_url.clone(), feature)
            .with_cookie(self.cookie.clone())
            .with_transports(self.transports.clone())
            .with_connect_timeout(self.connect_timeout)
            .with_reconnect(self.reconnect)
    }
}

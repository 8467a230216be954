//! Owned registry of live channels, one per feature area.

use std::{collections::HashMap, sync::Arc};

use crate::{error::ClientError, infrastructure::transport::Connector};

use super::{Channel, ChannelConfig, Feature};

/// Opens channels and guarantees at most one live channel per [`Feature`].
///
/// The registry is an explicit value owned by the caller; dropping it closes
/// every channel it still tracks.
pub struct TransportManager {
    connector: Arc<dyn Connector>,
    channels: HashMap<Feature, Channel>,
}

impl TransportManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            channels: HashMap::new(),
        }
    }

    /// Open the channel for `feature`.
    ///
    /// If a live channel for the feature already exists it is returned as is
    /// and `config` is ignored; no new connection is made.
    pub async fn open(
        &mut self,
        feature: Feature,
        config: ChannelConfig,
    ) -> Result<Channel, ClientError> {
        if let Some(existing) = self.channels.get(&feature)
            && existing.is_live()
        {
            tracing::debug!("[{}] Reusing live channel {}", feature, existing.id());
            return Ok(existing.clone());
        }

        let channel = Channel::open(feature, config, self.connector.clone()).await?;
        if let Some(stale) = self.channels.insert(feature, channel.clone()) {
            stale.close();
        }
        Ok(channel)
    }

    /// Live channel for `feature`, if any.
    pub fn get(&self, feature: Feature) -> Option<&Channel> {
        self.channels.get(&feature).filter(|c| c.is_live())
    }

    /// Close and forget the channel for `feature`.
    pub fn close(&mut self, feature: Feature) {
        if let Some(channel) = self.channels.remove(&feature) {
            channel.close();
        }
    }

    /// Close every tracked channel.
    pub fn close_all(&mut self) {
        for (_, channel) in self.channels.drain() {
            channel.close();
        }
    }
}

impl Drop for TransportManager {
    fn drop(&mut self) {
        self.close_all();
    }
}

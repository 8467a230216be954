//! In-memory connector for channel tests.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    domain::ReconnectPolicy,
    infrastructure::{
        dto::event::Frame,
        transport::{ConnectRequest, Connector, Link, TransportError, TransportKind},
    },
};

use super::{ChannelConfig, Feature, handle::lock};

/// Server side of one fake link.
pub(crate) struct ServerEnd {
    to_client: mpsc::UnboundedSender<Result<Frame, TransportError>>,
    from_client: mpsc::UnboundedReceiver<Frame>,
}

impl ServerEnd {
    pub(crate) fn push(&self, event: &str, data: serde_json::Value) {
        let _ = self.to_client.send(Ok(Frame {
            event: event.to_string(),
            data,
        }));
    }

    pub(crate) fn drop_link(&self, reason: &str) {
        let _ = self
            .to_client
            .send(Err(TransportError::Closed(reason.to_string())));
    }

    pub(crate) async fn next_frame(&mut self) -> Option<Frame> {
        tokio::time::timeout(Duration::from_secs(1), self.from_client.recv())
            .await
            .ok()
            .flatten()
    }

    /// Frames received so far, without waiting.
    pub(crate) fn drain_frames(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.from_client.try_recv() {
            frames.push(frame);
        }
        frames
    }
}

pub(crate) struct FakeConnector {
    calls: AtomicUsize,
    failures_left: AtomicUsize,
    hang: bool,
    servers: Mutex<Vec<Option<ServerEnd>>>,
}

impl FakeConnector {
    pub(crate) fn new() -> Arc<Self> {
        Self::failing(0)
    }

    /// Fail the next `failures` connect calls (`usize::MAX` fails forever).
    pub(crate) fn failing(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(failures),
            hang: false,
            servers: Mutex::new(Vec::new()),
        })
    }

    /// Never complete a connect call.
    pub(crate) fn hanging() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            hang: true,
            servers: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn fail_next(&self, failures: usize) {
        self.failures_left.store(failures, Ordering::SeqCst);
    }

    pub(crate) fn connect_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Take the server end of the `index`-th successful connection.
    pub(crate) async fn server(&self, index: usize) -> ServerEnd {
        for _ in 0..200 {
            if let Some(end) = lock(&self.servers).get_mut(index).and_then(Option::take) {
                return end;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("connection #{} was never established", index);
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        _kind: TransportKind,
        _request: &ConnectRequest,
    ) -> Result<Link, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        let fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
                0 => None,
                usize::MAX => Some(n),
                _ => Some(n - 1),
            })
            .is_ok();
        if fail {
            return Err(TransportError::Handshake("connection refused".to_string()));
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        lock(&self.servers).push(Some(ServerEnd {
            to_client: inbound_tx,
            from_client: outbound_rx,
        }));
        Ok(Link {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

/// Lobby config with a tiny retry delay.
pub(crate) fn fast_config() -> ChannelConfig {
    ChannelConfig::for_feature("http://lobby.test", Feature::Lobby)
        .with_connect_timeout(Duration::from_secs(1))
        .with_reconnect(ReconnectPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(5),
        })
}

/// Let the driver task process queued events.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

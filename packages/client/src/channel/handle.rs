//! Channel handle and its driver task.
//!
//! ## Design notes
//!
//! - The driver task owns the transport [`Link`]; handles talk to it through an
//!   outbound queue, so `send` never blocks.
//! - Handlers and the `closed` flag share one mutex. Dispatch holds it while a
//!   handler runs, so once `close` returns no handler can start.
//! - Inbound events queue up until [`Channel::listen`] is called, so owners can
//!   register handlers after `open` without losing early events.
//! - Queued frames carry the link generation they were sent under. The
//!   generation advances once `Disconnect` has been dispatched, and frames from
//!   an older generation are discarded instead of reaching the next link.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use tokio::{
    sync::{Notify, mpsc, watch},
    task::JoinHandle,
};

use crate::{
    error::ClientError,
    infrastructure::{
        dto::event::Frame,
        transport::{Connector, Link},
    },
};

use super::{ChannelConfig, ChannelEvent, ChannelId, ChannelStatus, EventKind, Feature, OutboundCommand};

type Handler = Box<dyn FnMut(&ChannelEvent) + Send>;
type AnyHandler = Box<dyn FnMut(&Frame) + Send>;
type Queued = (u64, Frame);

pub(super) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct Handlers {
    closed: bool,
    named: HashMap<EventKind, Handler>,
    any: Option<AnyHandler>,
}

/// State shared between handles and the driver task.
struct Shared {
    id: ChannelId,
    feature: Feature,
    handlers: Mutex<Handlers>,
    status: watch::Sender<ChannelStatus>,
    listening: AtomicBool,
    listen_gate: Notify,
    generation: AtomicU64,
}

impl Shared {
    fn set_status(&self, status: ChannelStatus) {
        self.status.send_if_modified(|current| {
            // Closed is terminal.
            if *current == status || *current == ChannelStatus::Closed {
                return false;
            }
            *current = status;
            true
        });
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    async fn wait_until_listening(&self) {
        if !self.listening.load(Ordering::Acquire) {
            self.listen_gate.notified().await;
        }
    }

    fn dispatch_frame(&self, frame: Frame) {
        tracing::trace!("[{} {}] <- {}", self.feature, self.id, frame.event);
        let decoded = ChannelEvent::decode(&frame);

        let mut handlers = lock(&self.handlers);
        if handlers.closed {
            return;
        }
        if let Some(any) = handlers.any.as_mut() {
            any(&frame);
        }
        match decoded {
            Ok(Some(event)) => Self::invoke(&mut handlers, &event),
            Ok(None) => tracing::debug!("[{}] No handler for event '{}'", self.feature, frame.event),
            Err(e) => tracing::warn!("[{}] Dropping event: {}", self.feature, e),
        }
    }

    fn dispatch_lifecycle(&self, event: ChannelEvent) {
        tracing::trace!("[{} {}] <- {:?}", self.feature, self.id, event);
        let mut handlers = lock(&self.handlers);
        if handlers.closed {
            return;
        }
        if let Some(any) = handlers.any.as_mut() {
            any(&event.lifecycle_frame());
        }
        Self::invoke(&mut handlers, &event);
    }

    fn invoke(handlers: &mut Handlers, event: &ChannelEvent) {
        if let Some(handler) = handlers.named.get_mut(&event.kind()) {
            handler(event);
        }
    }
}

struct Inner {
    shared: Arc<Shared>,
    outbound: mpsc::UnboundedSender<Queued>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn shutdown(&self) -> bool {
        {
            let mut handlers = lock(&self.shared.handlers);
            if handlers.closed {
                return false;
            }
            handlers.closed = true;
            handlers.named.clear();
            handlers.any = None;
        }
        if let Some(driver) = lock(&self.driver).take() {
            driver.abort();
        }
        self.shared.set_status(ChannelStatus::Closed);
        true
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Handle to one realtime channel.
///
/// Clones share the same connection. The connection is torn down by
/// [`Channel::close`] or when the last handle is dropped.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.inner.shared.id)
            .field("feature", &self.inner.shared.feature)
            .field("status", &self.status())
            .finish()
    }
}

impl Channel {
    /// Connect and spawn the driver task.
    ///
    /// Tries every configured transport per attempt, following the
    /// reconnection policy; fails with [`ClientError::ConnectionError`] once the
    /// budget is exhausted.
    pub(crate) async fn open(
        feature: Feature,
        config: ChannelConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, ClientError> {
        let id = ChannelId::generate();
        tracing::info!("[{} {}] Opening channel to {}", feature, id, config.base_url);

        let link = establish(connector.as_ref(), &config, feature, |_| {}).await?;

        let (status, _) = watch::channel(ChannelStatus::Connected);
        let shared = Arc::new(Shared {
            id,
            feature,
            handlers: Mutex::new(Handlers::default()),
            status,
            listening: AtomicBool::new(false),
            listen_gate: Notify::new(),
            generation: AtomicU64::new(0),
        });
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let driver = tokio::spawn(drive(shared.clone(), connector, config, link, outbound_rx));

        tracing::info!("[{} {}] Connected", feature, id);
        Ok(Self {
            inner: Arc::new(Inner {
                shared,
                outbound: outbound_tx,
                driver: Mutex::new(Some(driver)),
            }),
        })
    }

    pub fn id(&self) -> ChannelId {
        self.inner.shared.id
    }

    pub fn feature(&self) -> Feature {
        self.inner.shared.feature
    }

    pub fn status(&self) -> ChannelStatus {
        *self.inner.shared.status.borrow()
    }

    /// Observe status changes.
    pub fn subscribe_status(&self) -> watch::Receiver<ChannelStatus> {
        self.inner.shared.status.subscribe()
    }

    pub fn is_live(&self) -> bool {
        self.status().is_live()
    }

    /// Register the handler for one event kind, replacing any previous one.
    ///
    /// Handlers run on the driver task and must not block or close this channel.
    pub fn on<F>(&self, kind: EventKind, handler: F)
    where
        F: FnMut(&ChannelEvent) + Send + 'static,
    {
        let mut handlers = lock(&self.inner.shared.handlers);
        if handlers.closed {
            return;
        }
        if handlers.named.insert(kind, Box::new(handler)).is_some() {
            tracing::debug!(
                "[{}] Replaced handler for '{}'",
                self.inner.shared.feature,
                kind.as_str()
            );
        }
    }

    /// Register the catch-all handler. It sees every inbound event, including
    /// unknown and malformed ones, before the named handler runs.
    pub fn on_any<F>(&self, handler: F)
    where
        F: FnMut(&Frame) + Send + 'static,
    {
        let mut handlers = lock(&self.inner.shared.handlers);
        if !handlers.closed {
            handlers.any = Some(Box::new(handler));
        }
    }

    /// Start delivering events to handlers. Idempotent.
    pub fn listen(&self) {
        if !self.inner.shared.listening.swap(true, Ordering::AcqRel) {
            self.inner.shared.listen_gate.notify_one();
        }
    }

    /// Queue a command for the server. No acknowledgement is awaited.
    pub fn send(&self, command: &OutboundCommand) -> Result<(), ClientError> {
        if !self.is_live() {
            return Err(ClientError::ConnectionError(format!(
                "{} channel is {:?}",
                self.inner.shared.feature,
                self.status()
            )));
        }
        let frame = command.to_frame()?;
        tracing::debug!("[{}] -> {}", self.inner.shared.feature, frame.event);
        self.inner
            .outbound
            .send((self.inner.shared.generation(), frame))
            .map_err(|_| ClientError::ConnectionError("channel driver stopped".to_string()))
    }

    /// Tear the channel down. Idempotent; after it returns no handler fires.
    pub fn close(&self) {
        if self.inner.shutdown() {
            tracing::info!(
                "[{} {}] Channel closed",
                self.inner.shared.feature,
                self.inner.shared.id
            );
        }
    }

    /// Check if two handles refer to the same channel instance.
    pub fn same_channel(&self, other: &Channel) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Connect following the reconnection policy.
///
/// `on_failure` is called with a message after every failed attempt.
async fn establish<F>(
    connector: &dyn Connector,
    config: &ChannelConfig,
    feature: Feature,
    mut on_failure: F,
) -> Result<Link, ClientError>
where
    F: FnMut(&str),
{
    if config.transports.is_empty() {
        return Err(ClientError::ConnectionError(
            "no transport configured".to_string(),
        ));
    }

    let request = config.connect_request();
    let policy = config.reconnect;
    let mut attempts = 0;
    let mut last_error = String::new();

    while policy.should_attempt(attempts) {
        if attempts > 0 {
            tracing::info!(
                "[{}] Retrying in {:?}... (attempt {}/{})",
                feature,
                policy.delay,
                attempts + 1,
                policy.max_attempts
            );
            tokio::time::sleep(policy.delay).await;
        }
        attempts += 1;

        for kind in &config.transports {
            match tokio::time::timeout(config.connect_timeout, connector.connect(*kind, &request))
                .await
            {
                Ok(Ok(link)) => {
                    tracing::debug!("[{}] Connected via {}", feature, kind);
                    return Ok(link);
                }
                Ok(Err(e)) => {
                    tracing::warn!("[{}] {} connect failed: {}", feature, kind, e);
                    last_error = format!("{}: {}", kind, e);
                }
                Err(_) => {
                    tracing::warn!(
                        "[{}] {} connect timed out after {:?}",
                        feature,
                        kind,
                        config.connect_timeout
                    );
                    last_error = format!("{}: timed out after {:?}", kind, config.connect_timeout);
                }
            }
        }
        on_failure(&last_error);
    }

    tracing::error!(
        "[{}] Failed to connect after {} attempts",
        feature,
        attempts
    );
    Err(ClientError::ConnectionError(format!(
        "gave up after {} attempts ({})",
        attempts, last_error
    )))
}

enum PumpExit {
    Disconnected(String),
    OwnerGone,
}

async fn pump(
    shared: &Shared,
    link: &mut Link,
    outbound_rx: &mut mpsc::UnboundedReceiver<Queued>,
) -> PumpExit {
    loop {
        tokio::select! {
            incoming = link.inbound.recv() => match incoming {
                Some(Ok(frame)) => shared.dispatch_frame(frame),
                Some(Err(e)) => return PumpExit::Disconnected(e.to_string()),
                None => return PumpExit::Disconnected("transport closed".to_string()),
            },
            outgoing = outbound_rx.recv() => match outgoing {
                Some((generation, frame)) if generation != shared.generation() => {
                    tracing::warn!(
                        "[{}] Discarding '{}' queued before the last disconnect",
                        shared.feature,
                        frame.event
                    );
                }
                Some((_, frame)) => {
                    if let Err(e) = link.outbound.send(frame) {
                        tracing::warn!("[{}] Dropped '{}': transport closed", shared.feature, e.0.event);
                        return PumpExit::Disconnected("transport closed".to_string());
                    }
                }
                None => return PumpExit::OwnerGone,
            },
        }
    }
}

async fn drive(
    shared: Arc<Shared>,
    connector: Arc<dyn Connector>,
    config: ChannelConfig,
    mut link: Link,
    mut outbound_rx: mpsc::UnboundedReceiver<Queued>,
) {
    shared.wait_until_listening().await;
    shared.dispatch_lifecycle(ChannelEvent::Connect);

    loop {
        let reason = match pump(&shared, &mut link, &mut outbound_rx).await {
            PumpExit::Disconnected(reason) => reason,
            PumpExit::OwnerGone => return,
        };

        tracing::warn!("[{} {}] Disconnected: {}", shared.feature, shared.id, reason);
        shared.set_status(ChannelStatus::Reconnecting);
        shared.dispatch_lifecycle(ChannelEvent::Disconnect { reason });
        // Owners have seen the disconnect; anything queued before now is stale.
        shared.generation.fetch_add(1, Ordering::AcqRel);

        let reconnected = establish(connector.as_ref(), &config, shared.feature, |message| {
            shared.dispatch_lifecycle(ChannelEvent::ConnectError {
                message: message.to_string(),
            });
        })
        .await;

        match reconnected {
            Ok(new_link) => {
                link = new_link;
                tracing::info!("[{} {}] Reconnected", shared.feature, shared.id);
                shared.set_status(ChannelStatus::Connected);
                shared.dispatch_lifecycle(ChannelEvent::Connect);
            }
            Err(e) => {
                shared.set_status(ChannelStatus::Failed);
                shared.dispatch_lifecycle(ChannelEvent::ConnectError {
                    message: e.to_string(),
                });
                return;
            }
        }
    }
}

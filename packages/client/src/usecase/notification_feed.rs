//! UseCase: toast feed fed by the notification channel.

use std::{sync::Arc, time::Duration};

use quizlobby_shared::time::Clock;
use tokio::sync::mpsc;

use crate::{
    channel::{Channel, ChannelEvent, EventKind},
    domain::NotificationKind,
};

/// A notification ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub text: String,
    pub kind: NotificationKind,
    pub duration: Duration,
    /// Unix timestamp (milliseconds) after which the toast is dismissed
    pub expires_at: i64,
}

impl Toast {
    pub fn is_expired(&self, now_millis: i64) -> bool {
        now_millis >= self.expires_at
    }
}

/// Owns the notification channel and forwards each valid notification as a
/// [`Toast`]. Malformed payloads are dropped by the channel before they get here.
pub struct NotificationFeed {
    channel: Channel,
}

impl NotificationFeed {
    pub fn new(channel: Channel, clock: Arc<dyn Clock>) -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (toast_tx, toast_rx) = mpsc::unbounded_channel();

        channel.on_any(|frame| {
            tracing::debug!("[notifications] <- {} {}", frame.event, frame.data)
        });
        channel.on(EventKind::Notification, move |event| {
            let ChannelEvent::Notification(notification) = event else {
                return;
            };
            let duration_millis = i64::try_from(notification.duration.as_millis()).unwrap_or(i64::MAX);
            let toast = Toast {
                text: notification.text.clone(),
                kind: notification.kind,
                duration: notification.duration,
                expires_at: clock.now_millis().saturating_add(duration_millis),
            };
            tracing::debug!("Toast [{}] {}", toast.kind.as_str(), toast.text);
            if toast_tx.send(toast).is_err() {
                tracing::debug!("Toast receiver dropped");
            }
        });
        channel.on(EventKind::ConnectError, |event| {
            if let ChannelEvent::ConnectError { message } = event {
                tracing::warn!("Notification channel: {}", message);
            }
        });
        channel.listen();

        (Self { channel }, toast_rx)
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Close the notification channel. Idempotent.
    pub fn close(&self) {
        self.channel.close();
    }
}

impl Drop for NotificationFeed {
    fn drop(&mut self) {
        self.channel.close();
    }
}

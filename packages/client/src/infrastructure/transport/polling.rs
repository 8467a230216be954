//! HTTP long-polling transport built on reqwest.
//!
//! ## Wire format
//!
//! - `GET {url}?transport=polling` answers `{"sid": "..."}` (handshake)
//! - `GET {url}?transport=polling&sid=<sid>` answers a JSON array of frames
//! - `POST {url}?transport=polling&sid=<sid>` carries one frame as its body
//!
//! Servers normally hold a poll open until frames are ready. An empty answer
//! is followed by a short pause before the next poll.

use std::time::Duration;

use reqwest::{RequestBuilder, header::COOKIE};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::infrastructure::dto::event::Frame;

use super::{ConnectRequest, Link, TransportError};

/// Pause after a poll that returned no frames.
pub const EMPTY_POLL_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
struct HandshakeDto {
    sid: String,
}

/// Connects by long-polling over HTTP.
#[derive(Debug, Clone, Default)]
pub struct PollingConnector {
    client: reqwest::Client,
}

impl PollingConnector {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn connect(&self, request: &ConnectRequest) -> Result<Link, TransportError> {
        let url = request.polling_url()?;
        let cookie = request.cookie.clone();

        let handshake: HandshakeDto = with_cookie(self.client.get(&url), &cookie)
            .query(&[("transport", "polling")])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TransportError::Handshake(e.to_string()))?
            .json()
            .await
            .map_err(|e| TransportError::Handshake(e.to_string()))?;
        tracing::debug!("Polling handshake with {} completed (sid {})", url, handshake.sid);

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Frame>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let query = [("transport", "polling".to_string()), ("sid", handshake.sid)];

        // receive loop
        {
            let client = self.client.clone();
            let url = url.clone();
            let cookie = cookie.clone();
            let query = query.clone();
            let inbound_tx = inbound_tx.clone();
            tokio::spawn(async move {
                loop {
                    let poll = with_cookie(client.get(&url), &cookie).query(&query).send();
                    let result = tokio::select! {
                        _ = inbound_tx.closed() => break,
                        result = poll => result,
                    };
                    let frames = match result.and_then(|r| r.error_for_status()) {
                        Ok(response) => response.json::<Vec<Frame>>().await,
                        Err(e) => Err(e),
                    };
                    match frames {
                        Ok(frames) if frames.is_empty() => {
                            tokio::select! {
                                _ = inbound_tx.closed() => break,
                                _ = tokio::time::sleep(EMPTY_POLL_BACKOFF) => {}
                            }
                        }
                        Ok(frames) => {
                            for frame in frames {
                                if inbound_tx.send(Ok(frame)).is_err() {
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            let _ = inbound_tx.send(Err(TransportError::Io(e.to_string())));
                            break;
                        }
                    }
                }
                tracing::debug!("Polling receive loop for {} stopped", url);
            });
        }

        // send loop
        {
            let client = self.client.clone();
            tokio::spawn(async move {
                while let Some(frame) = outbound_rx.recv().await {
                    let sent = with_cookie(client.post(&url), &cookie)
                        .query(&query)
                        .json(&frame)
                        .send()
                        .await
                        .and_then(|r| r.error_for_status());
                    if let Err(e) = sent {
                        tracing::warn!("Polling send of '{}' failed: {}", frame.event, e);
                        let _ = inbound_tx.send(Err(TransportError::Io(e.to_string())));
                        break;
                    }
                }
            });
        }

        Ok(Link {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

fn with_cookie(builder: RequestBuilder, cookie: &Option<String>) -> RequestBuilder {
    match cookie {
        Some(cookie) => builder.header(COOKIE, cookie),
        None => builder,
    }
}

//! WebSocket transport built on tokio-tungstenite.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        http::{HeaderValue, header::COOKIE},
        protocol::Message,
    },
};

use crate::infrastructure::dto::event::Frame;

use super::{ConnectRequest, Link, TransportError};

/// Connects over WebSocket, attaching the cookie to the upgrade request.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub async fn connect(&self, request: &ConnectRequest) -> Result<Link, TransportError> {
        let url = request.websocket_url()?;
        let mut ws_request = url
            .as_str()
            .into_client_request()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        if let Some(cookie) = &request.cookie {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
            ws_request.headers_mut().insert(COOKIE, value);
        }

        let (ws_stream, response) = connect_async(ws_request)
            .await
            .map_err(|e| TransportError::Handshake(e.to_string()))?;
        tracing::debug!(
            "WebSocket handshake with {} completed ({})",
            url,
            response.status()
        );

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Frame>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let (mut write, mut read) = ws_stream.split();

            loop {
                tokio::select! {
                    outgoing = outbound_rx.recv() => {
                        let Some(frame) = outgoing else {
                            // Link dropped by the channel: close politely.
                            let _ = write.send(Message::Close(None)).await;
                            break;
                        };
                        let json = match serde_json::to_string(&frame) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!("Failed to serialize '{}' frame: {}", frame.event, e);
                                continue;
                            }
                        };
                        if let Err(e) = write.send(Message::Text(json.into())).await {
                            tracing::warn!("WebSocket write error: {}", e);
                            let _ = inbound_tx.send(Err(TransportError::Io(e.to_string())));
                            break;
                        }
                    }
                    incoming = read.next() => {
                        match incoming {
                            Some(Ok(Message::Text(text))) => {
                                match serde_json::from_str::<Frame>(&text) {
                                    Ok(frame) => {
                                        if inbound_tx.send(Ok(frame)).is_err() {
                                            break;
                                        }
                                    }
                                    Err(e) => tracing::warn!("Dropping undecodable text frame: {}", e),
                                }
                            }
                            Some(Ok(Message::Binary(data))) => {
                                tracing::warn!("Ignoring {} bytes of binary data", data.len());
                            }
                            Some(Ok(Message::Close(close_frame))) => {
                                let reason = close_frame
                                    .map(|f| f.reason.as_str().to_owned())
                                    .filter(|r| !r.is_empty())
                                    .unwrap_or_else(|| "server closed the connection".to_string());
                                let _ = inbound_tx.send(Err(TransportError::Closed(reason)));
                                break;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                let _ = inbound_tx.send(Err(TransportError::Io(e.to_string())));
                                break;
                            }
                            None => {
                                let _ = inbound_tx
                                    .send(Err(TransportError::Closed("stream ended".to_string())));
                                break;
                            }
                        }
                    }
                    _ = inbound_tx.closed() => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                }
            }

            tracing::debug!("WebSocket pump for {} stopped", url);
        });

        Ok(Link {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

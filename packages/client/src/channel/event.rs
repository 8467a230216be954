//! Typed protocol events.
//!
//! Inbound frames are decoded into [`ChannelEvent`] by name; adding an event
//! means adding a variant here, and every `match` over it must be updated.

use serde::de::DeserializeOwned;

use crate::{
    domain::{DeckId, Lobby, LobbyCode, Notification, Settings, UserId},
    error::ClientError,
    infrastructure::dto::event::{
        CreateLobbyDto, DisconnectDto, ErrorDto, Frame, KickPlayerDto, LobbyCreatedDto,
        LobbySnapshotDto, NotificationDto, SettingsDto, StartGameDto,
    },
};

/// Name of an inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connect,
    Disconnect,
    ConnectError,
    LobbyCreated,
    LobbyUpdate,
    Error,
    Notification,
}

impl EventKind {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::ConnectError => "connect_error",
            Self::LobbyCreated => "lobby_created",
            Self::LobbyUpdate => "lobby_update",
            Self::Error => "error",
            Self::Notification => "notification",
        }
    }

    /// Resolve a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "connect" => Some(Self::Connect),
            "disconnect" => Some(Self::Disconnect),
            "connect_error" => Some(Self::ConnectError),
            "lobby_created" => Some(Self::LobbyCreated),
            "lobby_update" => Some(Self::LobbyUpdate),
            "error" => Some(Self::Error),
            "notification" => Some(Self::Notification),
            _ => None,
        }
    }

    /// Lifecycle events are produced by the channel itself, never by the server.
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::Connect | Self::Disconnect | Self::ConnectError)
    }
}

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connect,
    Disconnect { reason: String },
    ConnectError { message: String },
    LobbyCreated { code: LobbyCode },
    LobbyUpdate(Lobby),
    Error { message: String },
    Notification(Notification),
}

impl ChannelEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connect => EventKind::Connect,
            Self::Disconnect { .. } => EventKind::Disconnect,
            Self::ConnectError { .. } => EventKind::ConnectError,
            Self::LobbyCreated { .. } => EventKind::LobbyCreated,
            Self::LobbyUpdate(_) => EventKind::LobbyUpdate,
            Self::Error { .. } => EventKind::Error,
            Self::Notification(_) => EventKind::Notification,
        }
    }

    /// Decode a server frame.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(event))` - known event with a valid payload
    /// * `Ok(None)` - unknown event name, or a reserved lifecycle name
    /// * `Err(ClientError::MalformedEvent)` - known event, payload missing fields
    pub fn decode(frame: &Frame) -> Result<Option<Self>, ClientError> {
        let Some(kind) = EventKind::from_name(&frame.event) else {
            return Ok(None);
        };
        if kind.is_lifecycle() {
            tracing::warn!("Server sent reserved lifecycle event '{}'", frame.event);
            return Ok(None);
        }

        let event = match kind {
            EventKind::LobbyCreated => {
                let dto: LobbyCreatedDto = payload(frame)?;
                Self::LobbyCreated {
                    code: LobbyCode::new(dto.code)
                        .map_err(|e| ClientError::malformed(&frame.event, e))?,
                }
            }
            EventKind::LobbyUpdate => {
                let dto: LobbySnapshotDto = payload(frame)?;
                Self::LobbyUpdate(Lobby::try_from(dto)?)
            }
            EventKind::Error => {
                let dto: ErrorDto = payload(frame)?;
                Self::Error {
                    message: dto.message,
                }
            }
            EventKind::Notification => {
                let dto: NotificationDto = payload(frame)?;
                Self::Notification(Notification::from(dto))
            }
            EventKind::Connect | EventKind::Disconnect | EventKind::ConnectError => {
                return Ok(None);
            }
        };
        Ok(Some(event))
    }

    /// Frame representation handed to catch-all handlers.
    pub(crate) fn lifecycle_frame(&self) -> Frame {
        let data = match self {
            Self::Disconnect { reason } => serde_json::to_value(DisconnectDto {
                reason: reason.clone(),
            }),
            Self::ConnectError { message } => serde_json::to_value(ErrorDto {
                message: message.clone(),
            }),
            _ => Ok(serde_json::Value::Null),
        };
        Frame {
            event: self.kind().as_str().to_string(),
            data: data.unwrap_or_default(),
        }
    }
}

fn payload<T: DeserializeOwned>(frame: &Frame) -> Result<T, ClientError> {
    serde_json::from_value(frame.data.clone()).map_err(|e| ClientError::malformed(&frame.event, e))
}

/// Commands the client sends; fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCommand {
    CreateLobby { deck_id: DeckId, settings: Settings },
    StartGame,
    KickPlayer { user_id: UserId },
}

impl OutboundCommand {
    /// Wire name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateLobby { .. } => "create_lobby",
            Self::StartGame => "start_game",
            Self::KickPlayer { .. } => "kick_player",
        }
    }

    pub fn to_frame(&self) -> Result<Frame, ClientError> {
        let frame = match self {
            Self::CreateLobby { deck_id, settings } => Frame::new(
                self.name(),
                &CreateLobbyDto {
                    deck_id: deck_id.as_str().to_string(),
                    settings: SettingsDto::from(settings),
                },
            ),
            Self::StartGame => Frame::new(self.name(), &StartGameDto::default()),
            Self::KickPlayer { user_id } => Frame::new(
                self.name(),
                &KickPlayerDto {
                    user_id: user_id.as_str().to_string(),
                },
            ),
        };
        frame.map_err(|e| ClientError::Encode {
            event: self.name().to_string(),
            reason: e.to_string(),
        })
    }
}

//! UseCase: lobby state machine.
//!
//! ## Phases
//!
//! `Connecting → Lobby → Game → Ended`, plus an orthogonal error condition
//! that any event may set and that never closes the channel by itself.
//!
//! ## Rules
//!
//! - The lobby is materialised by `lobby_created` and afterwards only ever
//!   replaced wholesale by `lobby_update` snapshots, never merged.
//! - Commands are checked here and refused before anything reaches the wire.
//! - After a reconnect the lobby is stale until the next snapshot; mutating
//!   commands are refused in that gap.
//!
//! The machine does no I/O. [`LobbySession`](super::LobbySession) feeds it
//! channel events and transmits the commands it approves.

use crate::{
    channel::{ChannelEvent, OutboundCommand},
    domain::{CommandError, DeckId, Identity, Lobby, LobbyStatus, Settings, UserId},
    error::ClientError,
};

/// Coarse UI phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connecting,
    Lobby,
    Game,
    Ended,
}

impl Phase {
    fn from_status(status: LobbyStatus) -> Self {
        match status {
            LobbyStatus::Waiting => Self::Lobby,
            LobbyStatus::Starting | LobbyStatus::Playing => Self::Game,
            LobbyStatus::Ended => Self::Ended,
        }
    }
}

/// Client-side policy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LobbyPolicy {
    /// Minimum roster size for `start_game`
    pub min_players_to_start: usize,
}

impl Default for LobbyPolicy {
    fn default() -> Self {
        Self {
            min_players_to_start: 1,
        }
    }
}

/// Snapshot of the machine published to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyView {
    pub phase: Phase,
    pub connected: bool,
    pub lobby: Option<Lobby>,
    /// Last connection or server error; cleared on (re)connect
    pub error: Option<ClientError>,
    /// `create_lobby` sent, `lobby_created` not yet received
    pub create_pending: bool,
    /// Reconnected with a lobby, waiting for a fresh `lobby_update`
    pub awaiting_snapshot: bool,
}

#[derive(Debug)]
pub struct LobbyMachine {
    identity: Identity,
    policy: LobbyPolicy,
    phase: Phase,
    connected: bool,
    lobby: Option<Lobby>,
    pending_create: Option<(DeckId, Settings)>,
    awaiting_snapshot: bool,
    error: Option<ClientError>,
}

impl LobbyMachine {
    pub fn new(identity: Identity, policy: LobbyPolicy) -> Self {
        Self {
            identity,
            policy,
            phase: Phase::Connecting,
            connected: false,
            lobby: None,
            pending_create: None,
            awaiting_snapshot: false,
            error: None,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn lobby(&self) -> Option<&Lobby> {
        self.lobby.as_ref()
    }

    pub fn error(&self) -> Option<&ClientError> {
        self.error.as_ref()
    }

    pub fn view(&self) -> LobbyView {
        LobbyView {
            phase: self.phase,
            connected: self.connected,
            lobby: self.lobby.clone(),
            error: self.error.clone(),
            create_pending: self.pending_create.is_some(),
            awaiting_snapshot: self.awaiting_snapshot,
        }
    }

    /// Apply one inbound event.
    pub fn apply(&mut self, event: &ChannelEvent) {
        match event {
            ChannelEvent::Connect => {
                self.connected = true;
                self.error = None;
                if self.phase == Phase::Connecting {
                    self.phase = Phase::Lobby;
                }
            }
            ChannelEvent::Disconnect { reason } => {
                self.connected = false;
                self.error = Some(ClientError::ConnectionError(format!(
                    "disconnected: {}",
                    reason
                )));
                if self.lobby.is_some() {
                    self.awaiting_snapshot = true;
                }
                // The reply to an in-flight create_lobby is lost with the link.
                self.pending_create = None;
            }
            ChannelEvent::ConnectError { message } => {
                self.connected = false;
                self.error = Some(ClientError::ConnectionError(message.clone()));
            }
            ChannelEvent::LobbyCreated { code } => {
                if let Some(lobby) = &self.lobby {
                    tracing::warn!(
                        "Ignoring lobby_created '{}': lobby '{}' already bound",
                        code,
                        lobby.code
                    );
                    return;
                }
                let Some((deck_id, settings)) = self.pending_create.take() else {
                    tracing::warn!("Ignoring unsolicited lobby_created '{}'", code);
                    return;
                };
                tracing::info!("Lobby '{}' created", code);
                self.lobby = Some(Lobby::created(code.clone(), deck_id, settings));
                self.phase = Phase::Lobby;
            }
            ChannelEvent::LobbyUpdate(snapshot) => {
                let hosts = snapshot.players.iter().filter(|p| p.is_host).count();
                if !snapshot.players.is_empty() && hosts != 1 {
                    tracing::warn!(
                        "Lobby '{}' snapshot has {} hosts",
                        snapshot.code,
                        hosts
                    );
                }
                tracing::debug!(
                    "Lobby '{}' snapshot: {} player(s), {}",
                    snapshot.code,
                    snapshot.players.len(),
                    snapshot.status
                );
                self.phase = Phase::from_status(snapshot.status);
                self.lobby = Some(snapshot.clone());
                self.pending_create = None;
                self.awaiting_snapshot = false;
            }
            ChannelEvent::Error { message } => {
                tracing::warn!("Server error: {}", message);
                self.error = Some(ClientError::ProtocolError(message.clone()));
                self.pending_create = None;
            }
            ChannelEvent::Notification(_) => {}
        }
    }

    /// Approve a `create_lobby` command.
    ///
    /// Refused while a lobby exists or a previous request is unanswered, so at
    /// most one creation is ever in flight per channel.
    pub fn create_lobby(
        &mut self,
        deck_id: &str,
        settings: Settings,
    ) -> Result<OutboundCommand, ClientError> {
        if let Some(lobby) = &self.lobby {
            return Err(CommandError::LobbyAlreadyExists {
                code: lobby.code.to_string(),
            }
            .into());
        }
        if self.pending_create.is_some() {
            return Err(CommandError::CreatePending.into());
        }
        self.ensure_connected()?;
        let deck_id = DeckId::new(deck_id.to_string())?;
        settings.validate()?;

        self.pending_create = Some((deck_id.clone(), settings.clone()));
        Ok(OutboundCommand::CreateLobby { deck_id, settings })
    }

    /// Forget an approved `create_lobby` that never made it onto the wire.
    pub fn abandon_create(&mut self) {
        self.pending_create = None;
    }

    /// Approve a `start_game` command.
    ///
    /// Only a convenience gate: the server decides whether the caller is the host.
    pub fn start_game(&self) -> Result<OutboundCommand, ClientError> {
        let lobby = self.synced_lobby()?;
        if lobby.status != LobbyStatus::Waiting {
            return Err(CommandError::NotWaiting {
                status: lobby.status.to_string(),
            }
            .into());
        }
        let actual = lobby.players.len();
        let required = self.policy.min_players_to_start;
        if actual < required {
            return Err(CommandError::NotEnoughPlayers { required, actual }.into());
        }
        Ok(OutboundCommand::StartGame)
    }

    /// Approve a `kick_player` command.
    pub fn kick_player(&self, user_id: &str) -> Result<OutboundCommand, ClientError> {
        let lobby = self.synced_lobby()?;
        let user_id = UserId::new(user_id.to_string())?;
        if user_id == self.identity.id {
            return Err(CommandError::SelfKick.into());
        }
        if !lobby.contains(&user_id) {
            tracing::debug!("'{}' is not on the roster of '{}'", user_id, lobby.code);
        }
        Ok(OutboundCommand::KickPlayer { user_id })
    }

    fn ensure_connected(&self) -> Result<(), CommandError> {
        if self.connected {
            Ok(())
        } else {
            Err(CommandError::NotConnected)
        }
    }

    /// Lobby that commands may act on.
    fn synced_lobby(&self) -> Result<&Lobby, CommandError> {
        self.ensure_connected()?;
        let lobby = self.lobby.as_ref().ok_or(CommandError::NoLobby)?;
        if self.awaiting_snapshot {
            return Err(CommandError::AwaitingSnapshot);
        }
        Ok(lobby)
    }
}

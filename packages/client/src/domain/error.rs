//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// UserId validation error
    #[error("UserId cannot be empty")]
    UserIdEmpty,

    /// DeckId validation error
    #[error("DeckId cannot be empty")]
    DeckIdEmpty,

    /// LobbyCode validation error
    #[error("LobbyCode cannot be empty")]
    LobbyCodeEmpty,

    /// Identifier too long error
    #[error("{kind} cannot exceed {max} characters (got {actual})")]
    TooLong {
        kind: &'static str,
        max: usize,
        actual: usize,
    },
}

/// Reasons a [`Settings`](super::Settings) value fails validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// Time limit of a `time` game is below the one-minute floor
    #[error("timeLimit must be at least {min} seconds (got {actual})")]
    TimeLimitTooShort { min: u32, actual: u32 },

    /// Threshold of a `correct_answers` or `score` game is below 1
    #[error("{field} must be at least {min} (got {actual})")]
    ThresholdTooLow {
        field: &'static str,
        min: u32,
        actual: u32,
    },

    /// Per-question time limit outside the allowed window
    #[error("questionTimeLimit must be within [{min}, {max}] seconds (got {actual})")]
    QuestionTimeLimitOutOfRange { min: u32, max: u32, actual: u32 },
}

/// Lobby commands refused before they reach the wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// `create_lobby` while a lobby is already bound to the channel
    #[error("a lobby already exists for this channel ({code})")]
    LobbyAlreadyExists { code: String },

    /// `create_lobby` sent again before the server acknowledged the first one
    #[error("a create_lobby request is already waiting for the server")]
    CreatePending,

    /// Command needs a lobby but none has been created yet
    #[error("no lobby has been created yet")]
    NoLobby,

    /// Lobby is no longer accepting a start request
    #[error("lobby is not waiting for players (status: {status})")]
    NotWaiting { status: String },

    /// Roster is below the configured minimum
    #[error("at least {required} player(s) required to start (got {actual})")]
    NotEnoughPlayers { required: usize, actual: usize },

    /// Host tried to kick themselves
    #[error("the host cannot kick themselves")]
    SelfKick,

    /// Channel reconnected and the lobby has not been re-synchronised yet
    #[error("waiting for a fresh lobby snapshot after reconnect")]
    AwaitingSnapshot,

    /// Channel is still connecting or has failed
    #[error("channel is not connected")]
    NotConnected,
}

//! Lobby state record.
//!
//! The client never edits a lobby's roster itself: a [`Lobby`] is either
//! materialised from `lobby_created` or replaced wholesale by a server
//! snapshot.

use std::fmt;

use super::{DeckId, LobbyCode, Settings, UserId};

/// Server-side status of a lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LobbyStatus {
    #[default]
    Waiting,
    Starting,
    Playing,
    Ended,
}

impl LobbyStatus {
    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Starting => "starting",
            Self::Playing => "playing",
            Self::Ended => "ended",
        }
    }

    /// Parse the wire representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "waiting" => Some(Self::Waiting),
            "starting" => Some(Self::Starting),
            "playing" => Some(Self::Playing),
            "ended" => Some(Self::Ended),
            _ => None,
        }
    }
}

impl fmt::Display for LobbyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member of a lobby roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub user_id: UserId,
    pub username: String,
    pub is_host: bool,
}

/// Canonical client-side view of a lobby.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lobby {
    pub code: LobbyCode,
    /// Players in join order
    pub players: Vec<Player>,
    pub status: LobbyStatus,
    pub deck_id: DeckId,
    pub settings: Settings,
}

impl Lobby {
    /// Lobby as it exists right after `lobby_created`: empty roster, `waiting`.
    pub fn created(code: LobbyCode, deck_id: DeckId, settings: Settings) -> Self {
        Self {
            code,
            players: Vec::new(),
            status: LobbyStatus::default(),
            deck_id,
            settings,
        }
    }

    /// Find the player flagged as host, if the roster has one.
    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }

    /// Check if the given user is on the roster.
    pub fn contains(&self, user_id: &UserId) -> bool {
        self.players.iter().any(|p| &p.user_id == user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str, is_host: bool) -> Player {
        Player {
            user_id: UserId::new(id.to_string()).unwrap(),
            username: id.to_uppercase(),
            is_host,
        }
    }

    #[test]
    fn test_created_lobby_defaults() {
        // テスト項目: lobby_created 直後の Lobby は空の参加者リストと waiting 状態を持つ
        // given (前提条件):
        let code = LobbyCode::new("AB12".to_string()).unwrap();
        let deck_id = DeckId::new("d1".to_string()).unwrap();

        // when (操作):
        let lobby = Lobby::created(code.clone(), deck_id, Settings::default());

        // then (期待する結果):
        assert_eq!(lobby.code, code);
        assert!(lobby.players.is_empty());
        assert_eq!(lobby.status, LobbyStatus::Waiting);
    }

    #[test]
    fn test_host_lookup() {
        // テスト項目: isHost が true の参加者がホストとして取得できる
        // given (前提条件):
        let mut lobby = Lobby::created(
            LobbyCode::new("AB12".to_string()).unwrap(),
            DeckId::new("d1".to_string()).unwrap(),
            Settings::default(),
        );
        lobby.players = vec![player("alice", true), player("bob", false)];

        // when (操作):
        let host = lobby.host();

        // then (期待する結果):
        assert_eq!(host.map(|p| p.user_id.as_str()), Some("alice"));
        assert!(lobby.contains(&UserId::new("bob".to_string()).unwrap()));
    }

    #[test]
    fn test_status_parse_round_names() {
        // テスト項目: 既知のステータス名のみが解釈される
        // given (前提条件):
        let names = ["waiting", "starting", "playing", "ended"];

        // when (操作) / then (期待する結果):
        for name in names {
            assert_eq!(LobbyStatus::parse(name).map(|s| s.as_str()), Some(name));
        }
        assert_eq!(LobbyStatus::parse("paused"), None);
    }
}

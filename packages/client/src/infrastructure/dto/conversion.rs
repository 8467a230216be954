//! Conversion logic between DTOs and domain entities.
//!
//! Inbound conversions are fallible: a payload that is valid JSON but misses
//! a required field becomes [`ClientError::MalformedEvent`].

use std::time::Duration;

use crate::{
    domain::{
        DeckId, Identity, Lobby, LobbyCode, LobbyStatus, Notification, NotificationKind, Player,
        Settings, UserId, WinCondition, notification::DEFAULT_DISPLAY_MILLIS,
    },
    error::ClientError,
};

use super::{
    event::{LobbySnapshotDto, NotificationDto, PlayerDto, SettingsDto},
    session::SessionUserDto,
};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&Settings> for SettingsDto {
    fn from(model: &Settings) -> Self {
        let (time_limit, correct_answers_threshold, score_threshold) = match model.win_condition {
            WinCondition::Time { time_limit_secs } => (Some(time_limit_secs), None, None),
            WinCondition::CorrectAnswers { threshold } => (None, Some(threshold), None),
            WinCondition::Score { threshold } => (None, None, Some(threshold)),
        };
        Self {
            win_condition: model.win_condition.as_str().to_string(),
            time_limit,
            correct_answers_threshold,
            score_threshold,
            reset_on_incorrect: model.reset_on_incorrect,
            question_time_limit: model.question_time_limit_secs,
            allow_late_join: model.allow_late_join,
            host_participates: model.host_participates,
        }
    }
}

// ========================================
// DTO → Domain Entity
// ========================================

const LOBBY_UPDATE: &str = "lobby_update";

impl TryFrom<SettingsDto> for Settings {
    type Error = ClientError;

    fn try_from(dto: SettingsDto) -> Result<Self, Self::Error> {
        let missing = |field: &str| {
            ClientError::malformed(
                LOBBY_UPDATE,
                format!("winCondition '{}' requires {}", dto.win_condition, field),
            )
        };
        let win_condition = match dto.win_condition.as_str() {
            "time" => WinCondition::Time {
                time_limit_secs: dto.time_limit.ok_or_else(|| missing("timeLimit"))?,
            },
            "correct_answers" => WinCondition::CorrectAnswers {
                threshold: dto
                    .correct_answers_threshold
                    .ok_or_else(|| missing("correctAnswersThreshold"))?,
            },
            "score" => WinCondition::Score {
                threshold: dto.score_threshold.ok_or_else(|| missing("scoreThreshold"))?,
            },
            other => {
                return Err(ClientError::malformed(
                    LOBBY_UPDATE,
                    format!("unknown winCondition '{}'", other),
                ));
            }
        };
        Ok(Self {
            win_condition,
            reset_on_incorrect: dto.reset_on_incorrect,
            question_time_limit_secs: dto.question_time_limit,
            allow_late_join: dto.allow_late_join,
            host_participates: dto.host_participates,
        })
    }
}

impl TryFrom<PlayerDto> for Player {
    type Error = ClientError;

    fn try_from(dto: PlayerDto) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: UserId::new(dto.user_id).map_err(|e| ClientError::malformed(LOBBY_UPDATE, e))?,
            username: dto.username,
            is_host: dto.is_host,
        })
    }
}

impl TryFrom<LobbySnapshotDto> for Lobby {
    type Error = ClientError;

    fn try_from(dto: LobbySnapshotDto) -> Result<Self, Self::Error> {
        let status = LobbyStatus::parse(&dto.status).ok_or_else(|| {
            ClientError::malformed(LOBBY_UPDATE, format!("unknown status '{}'", dto.status))
        })?;
        let players = dto
            .players
            .into_iter()
            .map(Player::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            code: LobbyCode::new(dto.code).map_err(|e| ClientError::malformed(LOBBY_UPDATE, e))?,
            players,
            status,
            deck_id: DeckId::new(dto.deck_id).map_err(|e| ClientError::malformed(LOBBY_UPDATE, e))?,
            settings: Settings::try_from(dto.settings)?,
        })
    }
}

impl From<NotificationDto> for Notification {
    fn from(dto: NotificationDto) -> Self {
        let kind = match dto.kind.as_deref() {
            None => NotificationKind::default(),
            Some(raw) => NotificationKind::parse(raw).unwrap_or_else(|| {
                tracing::debug!("Unknown notification type '{}', using info", raw);
                NotificationKind::default()
            }),
        };
        Self {
            text: dto.text,
            kind,
            duration: display_duration(dto.time),
        }
    }
}

/// Only a positive finite `time` is honoured.
fn display_duration(millis: Option<f64>) -> Duration {
    millis
        .filter(|ms| ms.is_finite() && *ms > 0.0)
        .and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok())
        .unwrap_or_else(|| {
            if let Some(ms) = millis {
                tracing::debug!("Ignoring notification time {}, using default", ms);
            }
            Duration::from_millis(DEFAULT_DISPLAY_MILLIS)
        })
}

impl TryFrom<SessionUserDto> for Identity {
    type Error = ClientError;

    fn try_from(dto: SessionUserDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(dto.id).map_err(|e| ClientError::SessionLookup(e.to_string()))?,
            name: dto.name,
            image: dto.image,
            email_verified: dto.email_verified,
        })
    }
}

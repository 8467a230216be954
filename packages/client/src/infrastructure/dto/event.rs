//! Realtime protocol DTOs.
//!
//! Every message on a channel is a [`Frame`]: an event name plus a JSON
//! payload. Field names inside payloads are camelCase on the wire.

use serde::{Deserialize, Serialize};

/// One message on a channel, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Frame {
    /// Build a frame from a serializable payload.
    pub fn new<T: Serialize>(event: &str, data: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event: event.to_string(),
            data: serde_json::to_value(data)?,
        })
    }
}

/// `lobby_created` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyCreatedDto {
    pub code: String,
}

/// Player entry inside a `lobby_update` snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDto {
    pub user_id: String,
    pub username: String,
    pub is_host: bool,
}

/// Settings as they appear on the wire: a discriminator plus optional
/// companion fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDto {
    pub win_condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answers_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<u32>,
    pub reset_on_incorrect: bool,
    pub question_time_limit: u32,
    pub allow_late_join: bool,
    pub host_participates: bool,
}

/// `lobby_update` payload: the full lobby snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbySnapshotDto {
    pub code: String,
    pub players: Vec<PlayerDto>,
    pub status: String,
    pub deck_id: String,
    pub settings: SettingsDto,
}

/// `error` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDto {
    pub message: String,
}

/// `disconnect` payload (transport lifecycle)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectDto {
    pub reason: String,
}

/// `notification` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDto {
    pub text: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Display time in milliseconds. Senders may emit any JSON number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
}

/// `create_lobby` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLobbyDto {
    pub deck_id: String,
    pub settings: SettingsDto,
}

/// `start_game` payload (always empty)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartGameDto {}

/// `kick_player` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickPlayerDto {
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_without_data_defaults_to_null() {
        // テスト項目: data を持たないフレーム (connect 等) も解析できる
        // given (前提条件):
        let text = r#"{"event":"start_game"}"#;

        // when (操作):
        let frame: Frame = serde_json::from_str(text).unwrap();

        // then (期待する結果):
        assert_eq!(frame.event, "start_game");
        assert!(frame.data.is_null());
    }

    #[test]
    fn test_settings_dto_wire_field_names() {
        // テスト項目: SettingsDto が camelCase のフィールド名でシリアライズされ、未使用の閾値は省略される
        // given (前提条件):
        let dto = SettingsDto {
            win_condition: "score".to_string(),
            time_limit: None,
            correct_answers_threshold: None,
            score_threshold: Some(50),
            reset_on_incorrect: true,
            question_time_limit: 20,
            allow_late_join: false,
            host_participates: true,
        };

        // when (操作):
        let value = serde_json::to_value(&dto).unwrap();

        // then (期待する結果):
        assert_eq!(
            value,
            json!({
                "winCondition": "score",
                "scoreThreshold": 50,
                "resetOnIncorrect": true,
                "questionTimeLimit": 20,
                "allowLateJoin": false,
                "hostParticipates": true
            })
        );
    }

    #[test]
    fn test_notification_dto_optional_fields() {
        // テスト項目: type と time を省略した notification を解析できる
        // given (前提条件):
        let value = json!({ "text": "hello" });

        // when (操作):
        let dto: NotificationDto = serde_json::from_value(value).unwrap();

        // then (期待する結果):
        assert_eq!(dto.text, "hello");
        assert!(dto.kind.is_none());
        assert!(dto.time.is_none());
    }

    #[test]
    fn test_kick_player_dto_wire_shape() {
        // テスト項目: kick_player のペイロードが {userId} になる
        // given (前提条件):
        let dto = KickPlayerDto {
            user_id: "u2".to_string(),
        };

        // when (操作):
        let frame = Frame::new("kick_player", &dto).unwrap();

        // then (期待する結果):
        assert_eq!(frame.data, json!({ "userId": "u2" }));
    }
}

//! Lobby settings and the validator that gates `create_lobby`.
//!
//! The win condition is a tagged union: each variant carries exactly the
//! numeric companion it needs, so a `score` game can never be sent with only
//! a `timeLimit` populated.

use super::error::SettingsError;

/// Minimum `timeLimit` (seconds) for a `time` game.
pub const MIN_TIME_LIMIT_SECS: u32 = 60;
/// Minimum threshold for `correct_answers` and `score` games.
pub const MIN_THRESHOLD: u32 = 1;
/// Allowed per-question time window (seconds), inclusive.
pub const QUESTION_TIME_LIMIT_RANGE: (u32, u32) = (5, 60);

/// How a game session concludes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinCondition {
    /// Game ends after `time_limit_secs` seconds
    Time { time_limit_secs: u32 },
    /// First player to `threshold` correct answers wins
    CorrectAnswers { threshold: u32 },
    /// First player to `threshold` points wins
    Score { threshold: u32 },
}

impl WinCondition {
    /// Wire name of the discriminator (`winCondition`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Time { .. } => "time",
            Self::CorrectAnswers { .. } => "correct_answers",
            Self::Score { .. } => "score",
        }
    }
}

/// Game configuration chosen by the host before the lobby is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub win_condition: WinCondition,
    pub reset_on_incorrect: bool,
    pub question_time_limit_secs: u32,
    pub allow_late_join: bool,
    pub host_participates: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            win_condition: WinCondition::CorrectAnswers { threshold: 10 },
            reset_on_incorrect: false,
            question_time_limit_secs: 30,
            allow_late_join: true,
            host_participates: true,
        }
    }
}

impl Settings {
    /// Check the settings for internal consistency.
    ///
    /// The server re-validates independently; this only saves a round trip on
    /// an obviously malformed request.
    pub fn validate(&self) -> Result<(), SettingsError> {
        match self.win_condition {
            WinCondition::Time { time_limit_secs } if time_limit_secs < MIN_TIME_LIMIT_SECS => {
                return Err(SettingsError::TimeLimitTooShort {
                    min: MIN_TIME_LIMIT_SECS,
                    actual: time_limit_secs,
                });
            }
            WinCondition::CorrectAnswers { threshold } if threshold < MIN_THRESHOLD => {
                return Err(SettingsError::ThresholdTooLow {
                    field: "correctAnswersThreshold",
                    min: MIN_THRESHOLD,
                    actual: threshold,
                });
            }
            WinCondition::Score { threshold } if threshold < MIN_THRESHOLD => {
                return Err(SettingsError::ThresholdTooLow {
                    field: "scoreThreshold",
                    min: MIN_THRESHOLD,
                    actual: threshold,
                });
            }
            _ => {}
        }

        let (min, max) = QUESTION_TIME_LIMIT_RANGE;
        if !(min..=max).contains(&self.question_time_limit_secs) {
            return Err(SettingsError::QuestionTimeLimitOutOfRange {
                min,
                max,
                actual: self.question_time_limit_secs,
            });
        }

        Ok(())
    }
}

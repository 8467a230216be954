//! Text formatting for the terminal client.

use quizlobby_shared::time::timestamp_to_rfc3339;

use crate::{
    domain::{Lobby, Settings, UserId, WinCondition},
    usecase::{LobbyView, Phase, Toast},
};

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the whole lobby view
    ///
    /// # Arguments
    ///
    /// * `view` - Current lobby view
    /// * `me` - The local user's ID (to mark as "me")
    pub fn format_view(view: &LobbyView, me: &UserId) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n\n{}\n", RULE));
        output.push_str(&format!(
            "Phase: {}{}\n",
            Self::phase_label(view.phase),
            if view.connected { "" } else { " (offline)" }
        ));

        match &view.lobby {
            Some(lobby) => output.push_str(&Self::format_lobby(lobby, me)),
            None if view.create_pending => output.push_str("Creating lobby...\n"),
            None => output.push_str("No lobby yet. Type 'create' to host one.\n"),
        }
        if view.awaiting_snapshot {
            output.push_str("(waiting for the server to resend the lobby)\n");
        }
        if let Some(error) = &view.error {
            output.push_str(&format!("! {}\n", error));
        }

        output.push_str(&format!("{}\n", RULE));
        output
    }

    /// Format lobby details and the roster
    pub fn format_lobby(lobby: &Lobby, me: &UserId) -> String {
        let mut output = String::new();
        output.push_str(&format!("Lobby {} [{}]\n", lobby.code, lobby.status));
        output.push_str(&format!("Deck: {}\n", lobby.deck_id));
        if let Some(host) = lobby.host() {
            output.push_str(&format!("Host: {}\n", host.username));
        }
        output.push_str(&format!("Rules: {}\n", Self::format_settings(&lobby.settings)));
        output.push_str("Players:\n");

        if lobby.players.is_empty() {
            output.push_str("(No players)\n");
        } else {
            for player in &lobby.players {
                let me_suffix = if &player.user_id == me { " (me)" } else { "" };
                let host_suffix = if player.is_host { " (host)" } else { "" };
                output.push_str(&format!(
                    "{}{}{} - {}\n",
                    player.username, host_suffix, me_suffix, player.user_id
                ));
            }
        }
        output
    }

    pub fn format_settings(settings: &Settings) -> String {
        let goal = match settings.win_condition {
            WinCondition::Time { time_limit_secs } => format!("{}s time limit", time_limit_secs),
            WinCondition::CorrectAnswers { threshold } => {
                format!("first to {} correct answers", threshold)
            }
            WinCondition::Score { threshold } => format!("first to {} points", threshold),
        };
        let mut rules = vec![goal, format!("{}s per question", settings.question_time_limit_secs)];
        if settings.reset_on_incorrect {
            rules.push("reset on incorrect".to_string());
        }
        if settings.allow_late_join {
            rules.push("late join".to_string());
        }
        if !settings.host_participates {
            rules.push("host spectates".to_string());
        }
        rules.join(", ")
    }

    /// Format a toast notification
    ///
    /// # Returns
    ///
    /// A formatted string with the notification and its expiry time
    pub fn format_toast(toast: &Toast) -> String {
        let until = timestamp_to_rfc3339(toast.expires_at)
            .unwrap_or_else(|| toast.expires_at.to_string());
        format!(
            "\n[{}] {} (until {})\n",
            toast.kind.as_str().to_uppercase(),
            toast.text,
            until
        )
    }

    pub fn format_error(message: &str) -> String {
        format!("\n! {}\n", message)
    }

    pub fn format_help() -> String {
        "\nCommands:\n  \
         create          host a lobby with the configured deck and rules\n  \
         start           start the game\n  \
         kick <userId>   remove a player\n  \
         status          show the lobby\n  \
         quit            leave\n"
            .to_string()
    }

    fn phase_label(phase: Phase) -> &'static str {
        match phase {
            Phase::Connecting => "connecting",
            Phase::Lobby => "lobby",
            Phase::Game => "game",
            Phase::Ended => "ended",
        }
    }
}

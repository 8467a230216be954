//! Terminal client that hosts a quiz lobby.
//!
//! Resolves the signed-in user through the session cookie, subscribes to
//! notifications and opens the lobby channel (WebSocket first, polling as
//! fallback, 5 reconnection attempts 1 second apart).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin quiz-lobby -- --deck d1 --cookie 'session=...'
//! cargo run --bin quiz-lobby -- -d d1 -w time --target 120 --transport polling
//! ```

use clap::{Parser, ValueEnum};

use quizlobby_client::{
    config::ClientConfig,
    domain::{Settings, WinCondition},
    infrastructure::transport::TransportKind,
    ui::run_client,
    usecase::LobbyPolicy,
};
use quizlobby_shared::logger::setup_logger;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum WinConditionArg {
    Time,
    CorrectAnswers,
    Score,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TransportArg {
    Websocket,
    Polling,
}

#[derive(Parser, Debug)]
#[command(name = "quiz-lobby")]
#[command(about = "Host a multiplayer quiz lobby from the terminal", long_about = None)]
struct Args {
    /// Game server origin
    #[arg(short = 'u', long, default_value = "http://127.0.0.1:3000")]
    url: String,

    /// Session cookie, e.g. 'session=abc'
    #[arg(short = 'c', long)]
    cookie: Option<String>,

    /// Deck (question set) to play
    #[arg(short = 'd', long)]
    deck: String,

    /// How the game is won
    #[arg(short = 'w', long, value_enum, default_value = "correct-answers")]
    win_condition: WinConditionArg,

    /// Companion value of the win condition (seconds for `time`, otherwise a threshold)
    #[arg(long, default_value_t = 10)]
    target: u32,

    /// Seconds allowed per question
    #[arg(long, default_value_t = 30)]
    question_time: u32,

    #[arg(long)]
    reset_on_incorrect: bool,

    #[arg(long)]
    no_late_join: bool,

    /// Host watches instead of playing
    #[arg(long)]
    host_spectates: bool,

    /// Players required before `start` is allowed
    #[arg(long, default_value_t = 1)]
    min_players: usize,

    /// Transports in preference order (repeatable)
    #[arg(short = 't', long = "transport", value_enum)]
    transports: Vec<TransportArg>,
}

impl Args {
    fn into_config(self) -> ClientConfig {
        let win_condition = match self.win_condition {
            WinConditionArg::Time => WinCondition::Time {
                time_limit_secs: self.target,
            },
            WinConditionArg::CorrectAnswers => WinCondition::CorrectAnswers {
                threshold: self.target,
            },
            WinConditionArg::Score => WinCondition::Score {
                threshold: self.target,
            },
        };

        let mut config = ClientConfig::new(self.url, self.deck);
        config.cookie = self.cookie;
        config.settings = Settings {
            win_condition,
            reset_on_incorrect: self.reset_on_incorrect,
            question_time_limit_secs: self.question_time,
            allow_late_join: !self.no_late_join,
            host_participates: !self.host_spectates,
        };
        config.policy = LobbyPolicy {
            min_players_to_start: self.min_players,
        };
        if !self.transports.is_empty() {
            config.transports = self
                .transports
                .into_iter()
                .map(|t| match t {
                    TransportArg::Websocket => TransportKind::WebSocket,
                    TransportArg::Polling => TransportKind::Polling,
                })
                .collect();
        }
        config
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = run_client(args.into_config()).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}

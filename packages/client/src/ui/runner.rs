//! Interactive client: bootstrap, open channels, then loop over user input,
//! lobby views and toasts.

use std::sync::Arc;

use quizlobby_shared::time::SystemClock;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use crate::{
    channel::{ChannelStatus, Feature, TransportManager},
    config::ClientConfig,
    domain::UserId,
    error::ClientError,
    infrastructure::{session_provider::HttpSessionProvider, transport::DefaultConnector},
    usecase::{LobbySession, NotificationFeed, SessionBootstrapper},
};

use super::{
    formatter::MessageFormatter,
    prompt::{UserCommand, redisplay_prompt},
};

/// Run the lobby client until the user quits or the lobby channel gives up.
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let provider = HttpSessionProvider::new(&config.base_url, config.cookie.clone());
    let bootstrapper = SessionBootstrapper::new(Arc::new(provider));
    let identity = bootstrapper.identity().await?.clone();

    let mut manager = TransportManager::new(Arc::new(DefaultConnector::new()));

    // Toasts are optional; the lobby still works without them.
    let (feed, mut toast_rx) = match manager
        .open(Feature::Notifications, config.notification_channel())
        .await
    {
        Ok(channel) => {
            let (feed, rx) = NotificationFeed::new(channel, Arc::new(SystemClock));
            (Some(feed), rx)
        }
        Err(e) => {
            tracing::warn!("Notifications unavailable: {}", e);
            let (_, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };
    let mut toasts_open = feed.is_some();

    let lobby_channel = manager.open(Feature::Lobby, config.lobby_channel()).await?;
    let session = LobbySession::new(lobby_channel, identity.clone(), config.policy);
    let mut view_rx = session.subscribe();
    let mut status_rx = session.channel().subscribe_status();

    println!(
        "\nSigned in as '{}'. Type 'help' for commands. Press Ctrl+C to exit.\n",
        identity.name
    );

    let mut input_rx = spawn_readline(identity.name.clone());

    loop {
        tokio::select! {
            line = input_rx.recv() => {
                let Some(line) = line else {
                    break;
                };
                match UserCommand::parse(&line) {
                    Ok(UserCommand::Quit) => break,
                    Ok(command) => execute(&session, &config, &identity.id, command),
                    Err(message) => print!("{}", MessageFormatter::format_error(&message)),
                }
                redisplay_prompt(&identity.name);
            }
            changed = view_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = view_rx.borrow_and_update().clone();
                print!("{}", MessageFormatter::format_view(&view, &identity.id));
                redisplay_prompt(&identity.name);
            }
            toast = toast_rx.recv(), if toasts_open => match toast {
                Some(toast) => {
                    print!("{}", MessageFormatter::format_toast(&toast));
                    redisplay_prompt(&identity.name);
                }
                None => toasts_open = false,
            },
            changed = status_rx.changed() => {
                if changed.is_err() || *status_rx.borrow_and_update() == ChannelStatus::Failed {
                    tracing::error!("Lobby connection lost for good. Exiting.");
                    break;
                }
            }
        }
    }

    session.close();
    if let Some(feed) = &feed {
        feed.close();
    }
    manager.close_all();
    tracing::info!("Client session ended");
    Ok(())
}

fn execute(session: &LobbySession, config: &ClientConfig, me: &UserId, command: UserCommand) {
    let result = match command {
        UserCommand::Create => session.create_lobby(&config.deck_id, config.settings.clone()),
        UserCommand::Start => session.start_game(),
        UserCommand::Kick(user_id) => session.kick_player(&user_id),
        UserCommand::Status => {
            print!("{}", MessageFormatter::format_view(&session.state(), me));
            Ok(())
        }
        UserCommand::Help => {
            print!("{}", MessageFormatter::format_help());
            Ok(())
        }
        UserCommand::Quit => Ok(()),
    };
    if let Err(e) = result {
        print!("{}", MessageFormatter::format_error(&e.to_string()));
    }
}

/// Read lines on a blocking thread (rustyline is synchronous).
fn spawn_readline(username: String) -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", username);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}

//! UseCase: lobby machine bound to a live lobby channel.
//!
//! Channel events are applied to the machine on the channel's driver task and
//! every resulting view is published through a `watch` channel. Commands are
//! approved by the machine and only then written to the channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::{
    channel::{Channel, EventKind, OutboundCommand},
    domain::{Identity, Settings},
    error::ClientError,
};

use super::lobby_machine::{LobbyMachine, LobbyPolicy, LobbyView};

const BOUND_EVENTS: [EventKind; 6] = [
    EventKind::Connect,
    EventKind::Disconnect,
    EventKind::ConnectError,
    EventKind::LobbyCreated,
    EventKind::LobbyUpdate,
    EventKind::Error,
];

fn lock(machine: &Mutex<LobbyMachine>) -> MutexGuard<'_, LobbyMachine> {
    machine.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct LobbySession {
    channel: Channel,
    machine: Arc<Mutex<LobbyMachine>>,
    view_tx: Arc<watch::Sender<LobbyView>>,
}

impl LobbySession {
    /// Bind a machine for `identity` to `channel` and start listening.
    pub fn new(channel: Channel, identity: Identity, policy: LobbyPolicy) -> Self {
        let machine = LobbyMachine::new(identity, policy);
        let (view_tx, _) = watch::channel(machine.view());
        let machine = Arc::new(Mutex::new(machine));
        let view_tx = Arc::new(view_tx);

        channel.on_any(|frame| tracing::debug!("[lobby] <- {} {}", frame.event, frame.data));
        for kind in BOUND_EVENTS {
            let machine = machine.clone();
            let view_tx = view_tx.clone();
            channel.on(kind, move |event| {
                let view = {
                    let mut machine = lock(&machine);
                    machine.apply(event);
                    machine.view()
                };
                view_tx.send_replace(view);
            });
        }
        channel.listen();

        Self {
            channel,
            machine,
            view_tx,
        }
    }

    /// Current view.
    pub fn state(&self) -> LobbyView {
        self.view_tx.borrow().clone()
    }

    /// Observe view changes.
    pub fn subscribe(&self) -> watch::Receiver<LobbyView> {
        self.view_tx.subscribe()
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Ask the server to create a lobby.
    ///
    /// Exactly one `create_lobby` frame is transmitted per accepted call; the
    /// lobby appears in the view once `lobby_created` arrives.
    pub fn create_lobby(&self, deck_id: &str, settings: Settings) -> Result<(), ClientError> {
        let mut machine = lock(&self.machine);
        let command = machine.create_lobby(deck_id, settings)?;
        if let Err(e) = self.channel.send(&command) {
            machine.abandon_create();
            return Err(e);
        }
        let view = machine.view();
        drop(machine);
        self.view_tx.send_replace(view);
        Ok(())
    }

    pub fn start_game(&self) -> Result<(), ClientError> {
        let machine = lock(&self.machine);
        let command = machine.start_game()?;
        self.transmit(&command)
    }

    pub fn kick_player(&self, user_id: &str) -> Result<(), ClientError> {
        let machine = lock(&self.machine);
        let command = machine.kick_player(user_id)?;
        self.transmit(&command)
    }

    fn transmit(&self, command: &OutboundCommand) -> Result<(), ClientError> {
        tracing::info!("Sending '{}'", command.name());
        self.channel.send(command)
    }

    /// Close the lobby channel. Idempotent.
    pub fn close(&self) {
        self.channel.close();
    }
}

impl Drop for LobbySession {
    fn drop(&mut self) {
        self.channel.close();
    }
}

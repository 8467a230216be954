//! UseCase layer: identity bootstrap, the lobby state machine bound to its
//! channel, and the notification feed.

pub mod bootstrap;
pub mod lobby_machine;
pub mod lobby_session;
pub mod notification_feed;

pub use bootstrap::SessionBootstrapper;
pub use lobby_machine::{LobbyMachine, LobbyPolicy, LobbyView, Phase};
pub use lobby_session::LobbySession;
pub use notification_feed::{NotificationFeed, Toast};

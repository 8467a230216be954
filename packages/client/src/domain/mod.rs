//! Domain layer: lobby records, settings and their validation rules.
//!
//! Nothing in here performs I/O; the state machine and the transports build
//! on these types.

pub mod error;
pub mod identity;
pub mod lobby;
pub mod notification;
pub mod reconnect;
pub mod settings;
pub mod value_object;

pub use error::{CommandError, SettingsError, ValueObjectError};
pub use identity::{Identity, SessionProvider};
pub use lobby::{Lobby, LobbyStatus, Player};
pub use notification::{Notification, NotificationKind};
pub use reconnect::ReconnectPolicy;
pub use settings::{Settings, WinCondition};
pub use value_object::{DeckId, LobbyCode, UserId};

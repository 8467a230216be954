//! Realtime lobby client library.
//!
//! Hosts a multiplayer quiz lobby over a reconnecting event channel: resolves
//! the signed-in identity, opens one channel per feature area, keeps the lobby
//! view in sync with server snapshots and gates host commands client-side.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod channel;
pub mod config;
pub mod error;

//! Infrastructure layer: wire DTOs, transports and the identity service client.

pub mod dto;
pub mod session_provider;
pub mod transport;

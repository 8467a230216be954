//! Data Transfer Objects for the realtime protocol and the identity service.

pub mod conversion;
pub mod event;
pub mod session;

//! Terminal front end.

pub mod formatter;
pub mod prompt;
pub mod runner;

pub use runner::run_client;

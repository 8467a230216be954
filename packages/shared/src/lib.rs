//! Shared utilities for quizlobby: logger setup and clock abstraction.

pub mod logger;
pub mod time;

//! Session orchestration for the chat wizard.
//!
//! Provides:
//! - `SessionRunner` - Runs a controller on its own task, one submission at a time

pub mod runner;

pub use runner::{RunnerError, SessionRunner};

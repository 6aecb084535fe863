//! Common utilities for temper2csv
//!
//! This crate provides shared functionality for the recorder: error handling,
//! logging setup, and the trigger channel that connects the timer running on
//! the Tokio runtime with the blocking sampling worker thread.

pub mod channel;
pub mod error;
pub mod logging;
pub mod test_utils;

pub use channel::{Trigger, TriggerReceiver, TriggerSender, create_trigger_channel};
pub use error::{Error, Result};
pub use logging::setup_logging;

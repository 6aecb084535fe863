//! USB subsystem
//!
//! Talks to the TEMPer sensor:
//! - Device discovery and opening
//! - Kernel driver detach and configuration
//! - The init/query control transfers and the interrupt response read
//! - Session lifetime (opened once, dropped on the first failure)
//!
//! Every call in here blocks, so it only ever runs on the sampling worker
//! thread, never on the Tokio runtime.

pub mod device;
pub mod session;
pub mod transfers;

#[cfg(test)]
pub(crate) mod mock;

// Re-export public types
pub use device::{DeviceOpener, RusbOpener, UsbTransport};
pub use session::{DeviceSession, SessionManager};

//! Protocol library for temper2csv
//!
//! This crate defines the vendor wire protocol spoken by the TEMPer USB
//! thermometer (`0c45:7401`): the fixed USB parameters, the two control
//! commands, decoding of the 8-byte interrupt response into Celsius, and the
//! error taxonomy shared by the driver and the sampling scheduler.
//!
//! # Example
//!
//! ```
//! use protocol::{RawResponse, wire};
//!
//! // Response as returned on endpoint 0x82 for 1.0 °C
//! let raw = RawResponse::new([0x80, 0x02, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);
//! assert_eq!(raw.celsius(), 1.0);
//! assert_eq!(wire::QUERY.payload.len(), wire::RESPONSE_LEN);
//! ```

pub mod error;
pub mod types;
pub mod wire;

pub use error::{DeviceError, Result, UsbError};
pub use types::{RawResponse, Reading, decode};
pub use wire::ControlCommand;

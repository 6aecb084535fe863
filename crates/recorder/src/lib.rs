//! temper2csv recorder
//!
//! Driver and sampling logic for the TEMPer USB thermometer. The `usb`
//! module speaks the vendor protocol, `sampler` turns timer triggers into
//! median readings, and `sink` writes them out as CSV.

pub mod config;
pub mod sampler;
pub mod sink;
pub mod usb;

//! Sensor data types
//!
//! Raw interrupt responses and the decoded readings handed to the sink.

use crate::wire::RESPONSE_LEN;

/// Celsius per ADC count (125 °C spans 32000 counts)
const CELSIUS_PER_COUNT: f64 = 125.0 / 32000.0;

/// Interrupt response as read from the input endpoint
///
/// Only bytes 2 (MSB) and 3 (LSB) carry the measurement; the rest are
/// reserved by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawResponse([u8; RESPONSE_LEN]);

impl RawResponse {
    pub const fn new(bytes: [u8; RESPONSE_LEN]) -> Self {
        Self(bytes)
    }

    /// The unscaled 16-bit ADC value
    pub fn raw_value(&self) -> u16 {
        u16::from_be_bytes([self.0[2], self.0[3]])
    }

    /// Decode to degrees Celsius
    pub fn celsius(&self) -> f64 {
        f64::from(self.raw_value()) * CELSIUS_PER_COUNT
    }

    pub fn as_bytes(&self) -> &[u8; RESPONSE_LEN] {
        &self.0
    }
}

impl From<[u8; RESPONSE_LEN]> for RawResponse {
    fn from(bytes: [u8; RESPONSE_LEN]) -> Self {
        Self(bytes)
    }
}

/// Convert a raw response into Celsius
pub fn decode(raw: &RawResponse) -> f64 {
    raw.celsius()
}

/// One recorded value
///
/// Emitted once per sampling cycle, stamped with the cycle start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Unix timestamp in seconds
    pub timestamp: i64,
    /// Aggregated temperature in degrees Celsius
    pub celsius: f64,
}

impl Reading {
    pub fn new(timestamp: i64, celsius: f64) -> Self {
        Self { timestamp, celsius }
    }
}

//! Test utilities for temper2csv
//!
//! Provides fixture builders and helper functions for testing across crates.
//!
//! # Example
//!
//! ```
//! use common::test_utils::raw_response_for;
//!
//! # fn main() {
//! let raw = raw_response_for(23.0);
//! assert_eq!(raw.celsius(), 23.0);
//! # }
//! ```

use protocol::RawResponse;
use std::future::Future;
use std::time::Duration;

/// Default test timeout (5 seconds)
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Build a response carrying the given ADC value in bytes 2 and 3
///
/// Reserved bytes are filled with the values a real sensor returns.
pub fn raw_response_from_value(value: u16) -> RawResponse {
    let [msb, lsb] = value.to_be_bytes();
    RawResponse::new([0x80, 0x02, msb, lsb, 0x4e, 0x20, 0x00, 0x00])
}

/// Build a response that decodes to (approximately) `celsius`
///
/// Values are rounded to the sensor resolution of 1/256 °C and clamped to
/// the 16-bit range.
pub fn raw_response_for(celsius: f64) -> RawResponse {
    let counts = (celsius * 256.0).round().clamp(0.0, f64::from(u16::MAX));
    raw_response_from_value(counts as u16)
}

/// Timeout wrapper for async tests
///
/// Wraps an async operation with a timeout to prevent tests from hanging.
///
/// # Example
/// ```ignore
/// use common::test_utils::{with_timeout, DEFAULT_TEST_TIMEOUT};
///
/// #[tokio::test]
/// async fn test_with_timeout() {
///     let result = with_timeout(DEFAULT_TEST_TIMEOUT, async { 42 }).await.unwrap();
///     assert_eq!(result, 42);
/// }
/// ```
pub async fn with_timeout<T, F>(duration: Duration, future: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| TimeoutError { duration })
}

/// Error returned when a test times out
#[derive(Debug)]
pub struct TimeoutError {
    /// The timeout duration that was exceeded
    pub duration: Duration,
}

impl std::fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Test timed out after {:?}", self.duration)
    }
}

impl std::error::Error for TimeoutError {}

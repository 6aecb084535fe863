//! Device error types

use thiserror::Error;

/// USB error types
///
/// Maps to libusb error codes. See rusb::Error for details.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsbError {
    /// Transfer timed out
    #[error("transfer timed out")]
    Timeout,
    /// Endpoint stalled (protocol error)
    #[error("endpoint stalled")]
    Pipe,
    /// Device was disconnected
    #[error("device disconnected")]
    NoDevice,
    /// Device, interface or driver not found
    #[error("entity not found")]
    NotFound,
    /// Resource is busy
    #[error("resource busy")]
    Busy,
    /// Buffer overflow
    #[error("buffer overflow")]
    Overflow,
    /// I/O error
    #[error("input/output error")]
    Io,
    /// Invalid parameter
    #[error("invalid parameter")]
    InvalidParam,
    /// Access denied (permissions)
    #[error("access denied (insufficient permissions)")]
    Access,
    /// Operation not supported on this platform
    #[error("operation not supported")]
    NotSupported,
    /// Transfer moved fewer bytes than required
    #[error("incomplete transfer: expected {expected} bytes, got {actual}")]
    Incomplete { expected: usize, actual: usize },
    /// Other error with message
    #[error("{message}")]
    Other { message: String },
}

/// Errors raised while talking to the sensor
///
/// None of these are recovered locally: the session is dropped before the
/// error is returned and the recorder terminates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// USB context could not be created or the device list could not be fetched
    #[error("failed to enumerate USB devices: {0}")]
    Enumeration(#[source] UsbError),

    /// No device with the supported VID:PID is visible
    #[error(
        "no supported device {vendor_id:04x}:{product_id:04x} found (or insufficient access rights)"
    )]
    NoDeviceFound { vendor_id: u16, product_id: u16 },

    /// A device descriptor could not be read during enumeration
    #[error("failed to read USB device descriptor: {0}")]
    DescriptorRead(#[source] UsbError),

    /// The matching device could not be opened
    #[error("failed to open USB device: {0}")]
    Open(#[source] UsbError),

    /// A kernel driver could not be detached from an interface
    #[error("failed to detach kernel driver from interface {interface}: {source}")]
    DriverDetach { interface: u8, source: UsbError },

    /// The device configuration could not be set
    #[error("failed to set USB device configuration {configuration}: {source}")]
    Configuration { configuration: u8, source: UsbError },

    /// The interface could not be claimed for a transfer
    #[error("failed to claim interface {interface}: {source}")]
    InterfaceClaim { interface: u8, source: UsbError },

    /// Control transfer failed or moved the wrong number of bytes
    #[error("USB control transfer failed: {0}")]
    ControlTransfer(#[source] UsbError),

    /// Interrupt transfer failed or returned a short response
    #[error("USB interrupt transfer failed: {0}")]
    InterruptTransfer(#[source] UsbError),
}

/// Type alias for device results
pub type Result<T> = std::result::Result<T, DeviceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_no_device_display() {
        let err = DeviceError::NoDeviceFound {
            vendor_id: 0x0c45,
            product_id: 0x7401,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("0c45:7401"));
        assert!(msg.contains("insufficient access rights"));
    }

    #[test]
    fn test_incomplete_display() {
        let err = DeviceError::ControlTransfer(UsbError::Incomplete {
            expected: 8,
            actual: 3,
        });
        let msg = format!("{}", err);
        assert!(msg.contains("control transfer failed"));
        assert!(msg.contains("expected 8 bytes, got 3"));
    }

    #[test]
    fn test_source_chain() {
        let err = DeviceError::InterfaceClaim {
            interface: 0,
            source: UsbError::Busy,
        };
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "resource busy");
    }
}

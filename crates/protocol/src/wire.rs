//! TEMPer wire constants
//!
//! The sensor speaks an undocumented HID-style protocol. Every value here must
//! match bit for bit or the device will not answer.

use std::time::Duration;

/// USB Vendor ID of the supported sensor
pub const VENDOR_ID: u16 = 0x0c45;

/// USB Product ID of the supported sensor
pub const PRODUCT_ID: u16 = 0x7401;

/// Interrupt IN endpoint carrying the response
pub const INPUT_ENDPOINT: u8 = 0x82;

/// Interface used for every transfer
pub const PRIMARY_INTERFACE: u8 = 0x00;

/// Interfaces the kernel HID driver may hold
pub const KERNEL_INTERFACES: [u8; 2] = [0x00, 0x01];

/// Configuration selected after open
pub const CONFIGURATION: u8 = 1;

/// bmRequestType: host-to-device, class, interface
pub const REQUEST_TYPE: u8 = 0x21;

/// bRequest: HID SET_REPORT
pub const REQUEST: u8 = 0x09;

/// Length of the query payload and of the interrupt response
pub const RESPONSE_LEN: usize = 8;

/// Timeout applied to every transfer
pub const TRANSFER_TIMEOUT: Duration = Duration::from_millis(5000);

/// A vendor command sent with a class control transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlCommand {
    /// wValue
    pub value: u16,
    /// wIndex
    pub index: u16,
    /// Data stage, sent as-is
    pub payload: &'static [u8],
}

impl ControlCommand {
    /// Number of bytes the transfer must move to count as successful
    pub fn expected_len(&self) -> usize {
        self.payload.len()
    }
}

/// Sent once right after the device is opened
pub const INIT: ControlCommand = ControlCommand {
    value: 0x0201,
    index: 0x0000,
    payload: &[0x01, 0x01],
};

/// Sent before every interrupt read to request a measurement
pub const QUERY: ControlCommand = ControlCommand {
    value: 0x0200,
    index: 0x0001,
    payload: &[0x01, 0x80, 0x33, 0x01, 0x00, 0x00, 0x00, 0x00],
};

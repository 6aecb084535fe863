//! USB transfer execution
//!
//! Control and interrupt transfers for the TEMPer protocol. Each transfer
//! claims the primary interface for its own duration only; the claim is
//! released on every path before the transfer returns.

use crate::usb::device::UsbTransport;
use protocol::{ControlCommand, DeviceError, UsbError, wire};
use std::ops::{Deref, DerefMut};
use tracing::{debug, warn};

/// Interface claim that is released on drop
struct ClaimedInterface<'a, T: UsbTransport> {
    transport: &'a mut T,
    interface: u8,
}

impl<'a, T: UsbTransport> ClaimedInterface<'a, T> {
    fn claim(transport: &'a mut T, interface: u8) -> Result<Self, DeviceError> {
        transport.claim_interface(interface).map_err(|e| {
            warn!("Failed to claim interface {}: {}", interface, e);
            DeviceError::InterfaceClaim {
                interface,
                source: map_rusb_error(e),
            }
        })?;

        debug!("Claimed interface {}", interface);
        Ok(Self {
            transport,
            interface,
        })
    }
}

impl<T: UsbTransport> Deref for ClaimedInterface<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &*self.transport
    }
}

impl<T: UsbTransport> DerefMut for ClaimedInterface<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut *self.transport
    }
}

impl<T: UsbTransport> Drop for ClaimedInterface<'_, T> {
    fn drop(&mut self) {
        match self.transport.release_interface(self.interface) {
            Ok(()) => debug!("Released interface {}", self.interface),
            Err(e) => warn!("Failed to release interface {}: {}", self.interface, e),
        }
    }
}

/// Send a vendor command with a class control transfer
///
/// The transfer must move exactly `command.expected_len()` bytes.
pub fn control_transfer<T: UsbTransport>(
    transport: &mut T,
    command: &ControlCommand,
) -> Result<(), DeviceError> {
    let mut claimed = ClaimedInterface::claim(transport, wire::PRIMARY_INTERFACE)?;

    debug!(
        "Control transfer: request_type={:#x}, request={:#x}, value={:#06x}, index={:#06x}, data_len={}",
        wire::REQUEST_TYPE,
        wire::REQUEST,
        command.value,
        command.index,
        command.payload.len()
    );

    let written = claimed
        .write_control(
            wire::REQUEST_TYPE,
            wire::REQUEST,
            command.value,
            command.index,
            command.payload,
            wire::TRANSFER_TIMEOUT,
        )
        .map_err(|e| {
            warn!("Control transfer failed: {}", e);
            DeviceError::ControlTransfer(map_rusb_error(e))
        })?;

    if written != command.expected_len() {
        warn!(
            "Control transfer incomplete: {} of {} bytes",
            written,
            command.expected_len()
        );
        return Err(DeviceError::ControlTransfer(UsbError::Incomplete {
            expected: command.expected_len(),
            actual: written,
        }));
    }

    debug!("Control transfer succeeded: {} bytes", written);
    Ok(())
}

/// Fill `buffer` from an interrupt IN endpoint
///
/// A read shorter than the buffer is an error.
pub fn interrupt_transfer<T: UsbTransport>(
    transport: &mut T,
    endpoint: u8,
    buffer: &mut [u8],
) -> Result<(), DeviceError> {
    let mut claimed = ClaimedInterface::claim(transport, wire::PRIMARY_INTERFACE)?;

    debug!(
        "Interrupt transfer: endpoint={:#x}, len={}, timeout={}ms",
        endpoint,
        buffer.len(),
        wire::TRANSFER_TIMEOUT.as_millis()
    );

    let read = claimed
        .read_interrupt(endpoint, buffer, wire::TRANSFER_TIMEOUT)
        .map_err(|e| {
            warn!("Interrupt transfer failed: {}", e);
            DeviceError::InterruptTransfer(map_rusb_error(e))
        })?;

    if read != buffer.len() {
        warn!(
            "Interrupt transfer incomplete: {} of {} bytes",
            read,
            buffer.len()
        );
        return Err(DeviceError::InterruptTransfer(UsbError::Incomplete {
            expected: buffer.len(),
            actual: read,
        }));
    }

    debug!("Interrupt transfer succeeded: {} bytes", read);
    Ok(())
}

/// Map rusb::Error to protocol::UsbError
pub fn map_rusb_error(err: rusb::Error) -> UsbError {
    match err {
        rusb::Error::Timeout => UsbError::Timeout,
        rusb::Error::Pipe => UsbError::Pipe,
        rusb::Error::NoDevice => UsbError::NoDevice,
        rusb::Error::NotFound => UsbError::NotFound,
        rusb::Error::Busy => UsbError::Busy,
        rusb::Error::Overflow => UsbError::Overflow,
        rusb::Error::Io => UsbError::Io,
        rusb::Error::InvalidParam => UsbError::InvalidParam,
        rusb::Error::Access => UsbError::Access,
        rusb::Error::NotSupported => UsbError::NotSupported,
        _ => UsbError::Other {
            message: err.to_string(),
        },
    }
}

//! USB device abstraction
//!
//! This module puts the handful of rusb handle operations the driver needs
//! behind the `UsbTransport` trait and locates the sensor on the bus.

use crate::usb::transfers::map_rusb_error;
use protocol::{DeviceError, wire};
use rusb::{Context, Device, DeviceHandle, UsbContext};
use std::time::Duration;
use tracing::{debug, info};

/// Operations on an opened USB device
///
/// Implemented for `rusb::DeviceHandle`; tests substitute a scripted mock.
pub trait UsbTransport {
    /// Whether a kernel driver is bound to `interface`
    fn kernel_driver_active(&self, interface: u8) -> Result<bool, rusb::Error>;

    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), rusb::Error>;

    fn set_active_configuration(&mut self, configuration: u8) -> Result<(), rusb::Error>;

    fn claim_interface(&mut self, interface: u8) -> Result<(), rusb::Error>;

    fn release_interface(&mut self, interface: u8) -> Result<(), rusb::Error>;

    /// OUT control transfer, returns the number of bytes written
    fn write_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error>;

    /// IN interrupt transfer, returns the number of bytes read
    fn read_interrupt(
        &mut self,
        endpoint: u8,
        buffer: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error>;
}

impl<T: UsbContext> UsbTransport for DeviceHandle<T> {
    fn kernel_driver_active(&self, interface: u8) -> Result<bool, rusb::Error> {
        DeviceHandle::kernel_driver_active(self, interface)
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), rusb::Error> {
        DeviceHandle::detach_kernel_driver(self, interface)
    }

    fn set_active_configuration(&mut self, configuration: u8) -> Result<(), rusb::Error> {
        DeviceHandle::set_active_configuration(self, configuration)
    }

    fn claim_interface(&mut self, interface: u8) -> Result<(), rusb::Error> {
        DeviceHandle::claim_interface(self, interface)
    }

    fn release_interface(&mut self, interface: u8) -> Result<(), rusb::Error> {
        DeviceHandle::release_interface(self, interface)
    }

    fn write_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        DeviceHandle::write_control(self, request_type, request, value, index, data, timeout)
    }

    fn read_interrupt(
        &mut self,
        endpoint: u8,
        buffer: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        DeviceHandle::read_interrupt(self, endpoint, buffer, timeout)
    }
}

/// Finds and opens the sensor
pub trait DeviceOpener {
    type Transport: UsbTransport;

    /// Open the first supported device on the bus
    ///
    /// The returned transport is unconfigured and has no interface claimed.
    fn open(&mut self) -> Result<Self::Transport, DeviceError>;
}

/// Opens the sensor through libusb
#[derive(Debug, Default)]
pub struct RusbOpener;

impl RusbOpener {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceOpener for RusbOpener {
    type Transport = DeviceHandle<Context>;

    fn open(&mut self) -> Result<Self::Transport, DeviceError> {
        let context = Context::new().map_err(|e| DeviceError::Enumeration(map_rusb_error(e)))?;
        let device = find_sensor(&context)?;

        let handle = device
            .open()
            .map_err(|e| DeviceError::Open(map_rusb_error(e)))?;

        info!(
            "Opened TEMPer sensor {:04x}:{:04x} at bus {:03} device {:03}",
            wire::VENDOR_ID,
            wire::PRODUCT_ID,
            device.bus_number(),
            device.address()
        );
        Ok(handle)
    }
}

/// Locate the first attached device with the supported VID:PID
pub fn find_sensor<T: UsbContext>(context: &T) -> Result<Device<T>, DeviceError> {
    let devices = context
        .devices()
        .map_err(|e| DeviceError::Enumeration(map_rusb_error(e)))?;

    debug!("Scanning {} USB devices", devices.len());

    for device in devices.iter() {
        let descriptor = device
            .device_descriptor()
            .map_err(|e| DeviceError::DescriptorRead(map_rusb_error(e)))?;

        if is_supported(descriptor.vendor_id(), descriptor.product_id()) {
            debug!(
                "Found sensor: bus={}, addr={}",
                device.bus_number(),
                device.address()
            );
            return Ok(device);
        }
    }

    Err(DeviceError::NoDeviceFound {
        vendor_id: wire::VENDOR_ID,
        product_id: wire::PRODUCT_ID,
    })
}

/// Check if a VID/PID pair identifies the supported sensor
pub fn is_supported(vendor_id: u16, product_id: u16) -> bool {
    vendor_id == wire::VENDOR_ID && product_id == wire::PRODUCT_ID
}

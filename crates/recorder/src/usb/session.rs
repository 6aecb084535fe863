//! Device session management
//!
//! The recorder keeps exactly one open handle to the sensor. It is opened on
//! the first read, reused for every read after that, and dropped (which
//! closes the handle) as soon as any transfer on it fails.

use crate::usb::device::{DeviceOpener, UsbTransport};
use crate::usb::transfers::{control_transfer, interrupt_transfer, map_rusb_error};
use protocol::{DeviceError, RawResponse, wire};
use tracing::{debug, info, warn};

/// An opened, configured and initialized sensor
pub struct DeviceSession<T: UsbTransport> {
    transport: T,
    reads: u64,
}

impl<T: UsbTransport> DeviceSession<T> {
    /// Prepare a freshly opened device for use
    ///
    /// Detaches kernel drivers, selects the configuration and sends the init
    /// command. On error the transport is dropped, closing the handle.
    pub fn establish(mut transport: T) -> Result<Self, DeviceError> {
        detach_kernel_drivers(&mut transport)?;

        transport
            .set_active_configuration(wire::CONFIGURATION)
            .map_err(|e| DeviceError::Configuration {
                configuration: wire::CONFIGURATION,
                source: map_rusb_error(e),
            })?;
        debug!("Selected configuration {}", wire::CONFIGURATION);

        let mut session = Self {
            transport,
            reads: 0,
        };
        control_transfer(&mut session.transport, &wire::INIT)?;
        debug!("Sensor initialized");

        Ok(session)
    }

    /// Query the sensor and read its 8-byte response
    pub fn read_raw(&mut self) -> Result<RawResponse, DeviceError> {
        control_transfer(&mut self.transport, &wire::QUERY)?;

        let mut buffer = [0u8; wire::RESPONSE_LEN];
        interrupt_transfer(&mut self.transport, wire::INPUT_ENDPOINT, &mut buffer)?;

        self.reads += 1;
        Ok(RawResponse::new(buffer))
    }

    /// Number of successful reads on this session
    pub fn reads(&self) -> u64 {
        self.reads
    }
}

/// Detach kernel drivers from both sensor interfaces
fn detach_kernel_drivers<T: UsbTransport>(transport: &mut T) -> Result<(), DeviceError> {
    for interface in wire::KERNEL_INTERFACES {
        match transport.kernel_driver_active(interface) {
            Ok(true) => {
                debug!("Detaching kernel driver from interface {}", interface);
                match transport.detach_kernel_driver(interface) {
                    Ok(()) | Err(rusb::Error::NotFound) => {}
                    Err(e) => {
                        return Err(DeviceError::DriverDetach {
                            interface,
                            source: map_rusb_error(e),
                        });
                    }
                }
            }
            Ok(false) => {
                debug!("No kernel driver active on interface {}", interface);
            }
            Err(rusb::Error::NotSupported) | Err(rusb::Error::NotFound) => {
                debug!(
                    "Kernel driver state unavailable for interface {}",
                    interface
                );
            }
            Err(e) => {
                return Err(DeviceError::DriverDetach {
                    interface,
                    source: map_rusb_error(e),
                });
            }
        }
    }

    Ok(())
}

/// Owner of the process-wide sensor session
///
/// The session is created lazily by the first read; later reads reuse it.
pub struct SessionManager<O: DeviceOpener> {
    opener: O,
    session: Option<DeviceSession<O::Transport>>,
}

impl<O: DeviceOpener> SessionManager<O> {
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            session: None,
        }
    }

    /// Get the open session, opening the device on first use
    pub fn session(&mut self) -> Result<&mut DeviceSession<O::Transport>, DeviceError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => {
                let transport = self.opener.open()?;
                let session = DeviceSession::establish(transport)?;
                info!("TEMPer session established");
                session
            }
        };

        Ok(self.session.insert(session))
    }

    /// Read one temperature in degrees Celsius
    ///
    /// A failed transfer closes the session before the error is returned.
    pub fn read_temperature(&mut self) -> Result<f64, DeviceError> {
        let session = self.session()?;

        match session.read_raw() {
            Ok(raw) => {
                let celsius = raw.celsius();
                debug!("Raw response {:02x?} -> {:.2}°C", raw.as_bytes(), celsius);
                Ok(celsius)
            }
            Err(e) => {
                self.close();
                Err(e)
            }
        }
    }

    /// Whether a session is currently open
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Drop the session, closing the device handle
    pub fn close(&mut self) {
        if let Some(session) = self.session.take() {
            warn!("Closing TEMPer session after {} reads", session.reads());
        }
    }
}

//! Scripted USB transport for driver tests

use crate::usb::device::{DeviceOpener, UsbTransport};
use protocol::DeviceError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A call observed by the mock, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    KernelDriverActive(u8),
    DetachKernelDriver(u8),
    SetConfiguration(u8),
    Claim(u8),
    Release(u8),
    WriteControl {
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: Vec<u8>,
    },
    ReadInterrupt {
        endpoint: u8,
        len: usize,
    },
}

/// Observes a `MockTransport` after it has been moved into a session
#[derive(Clone, Default)]
pub struct MockProbe {
    calls: Arc<Mutex<Vec<Call>>>,
    dropped: Arc<AtomicBool>,
}

impl MockProbe {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn claims(&self) -> usize {
        self.count(|c| matches!(c, Call::Claim(_)))
    }

    pub fn releases(&self) -> usize {
        self.count(|c| matches!(c, Call::Release(_)))
    }

    pub fn control_writes(&self) -> usize {
        self.count(|c| matches!(c, Call::WriteControl { .. }))
    }

    pub fn interrupt_reads(&self) -> usize {
        self.count(|c| matches!(c, Call::ReadInterrupt { .. }))
    }

    /// Whether the transport (the "device handle") has been dropped
    pub fn is_closed(&self) -> bool {
        self.dropped.load(Ordering::SeqCst)
    }

    fn count(&self, f: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| f(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

/// In-memory stand-in for an opened TEMPer
///
/// Control transfers succeed with the full payload length unless scripted
/// otherwise; interrupt reads return scripted responses and time out once
/// the script runs dry.
#[derive(Default)]
pub struct MockTransport {
    probe: MockProbe,
    /// Interfaces with a kernel driver bound
    pub kernel_drivers: Vec<u8>,
    pub kernel_query_error: Option<rusb::Error>,
    pub detach_error: Option<rusb::Error>,
    pub configuration_error: Option<rusb::Error>,
    pub claim_error: Option<rusb::Error>,
    pub release_error: Option<rusb::Error>,
    control_results: VecDeque<Result<usize, rusb::Error>>,
    interrupt_results: VecDeque<Result<Vec<u8>, rusb::Error>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> MockProbe {
        self.probe.clone()
    }

    pub fn push_control_result(&mut self, result: Result<usize, rusb::Error>) {
        self.control_results.push_back(result);
    }

    pub fn push_interrupt_result(&mut self, result: Result<Vec<u8>, rusb::Error>) {
        self.interrupt_results.push_back(result);
    }

    pub fn push_response(&mut self, response: [u8; 8]) {
        self.push_interrupt_result(Ok(response.to_vec()));
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.probe.dropped.store(true, Ordering::SeqCst);
    }
}

impl UsbTransport for MockTransport {
    fn kernel_driver_active(&self, interface: u8) -> Result<bool, rusb::Error> {
        self.probe.record(Call::KernelDriverActive(interface));
        match self.kernel_query_error {
            Some(e) => Err(e),
            None => Ok(self.kernel_drivers.contains(&interface)),
        }
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), rusb::Error> {
        self.probe.record(Call::DetachKernelDriver(interface));
        match self.detach_error {
            Some(e) => Err(e),
            None => {
                self.kernel_drivers.retain(|i| *i != interface);
                Ok(())
            }
        }
    }

    fn set_active_configuration(&mut self, configuration: u8) -> Result<(), rusb::Error> {
        self.probe.record(Call::SetConfiguration(configuration));
        self.configuration_error.map_or(Ok(()), Err)
    }

    fn claim_interface(&mut self, interface: u8) -> Result<(), rusb::Error> {
        self.probe.record(Call::Claim(interface));
        self.claim_error.map_or(Ok(()), Err)
    }

    fn release_interface(&mut self, interface: u8) -> Result<(), rusb::Error> {
        self.probe.record(Call::Release(interface));
        self.release_error.map_or(Ok(()), Err)
    }

    fn write_control(
        &mut self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
        _timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        self.probe.record(Call::WriteControl {
            request_type,
            request,
            value,
            index,
            data: data.to_vec(),
        });
        self.control_results.pop_front().unwrap_or(Ok(data.len()))
    }

    fn read_interrupt(
        &mut self,
        endpoint: u8,
        buffer: &mut [u8],
        _timeout: Duration,
    ) -> Result<usize, rusb::Error> {
        self.probe.record(Call::ReadInterrupt {
            endpoint,
            len: buffer.len(),
        });
        let data = self
            .interrupt_results
            .pop_front()
            .unwrap_or(Err(rusb::Error::Timeout))?;
        let len = data.len().min(buffer.len());
        buffer[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }
}

/// Hands out scripted transports and counts open attempts
#[derive(Default)]
pub struct MockOpener {
    transports: VecDeque<Result<MockTransport, DeviceError>>,
    opens: Arc<AtomicU32>,
}

impl MockOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transport(transport: MockTransport) -> Self {
        let mut opener = Self::new();
        opener.push(Ok(transport));
        opener
    }

    pub fn push(&mut self, result: Result<MockTransport, DeviceError>) {
        self.transports.push_back(result);
    }

    /// Shared counter of `open` calls
    pub fn opens(&self) -> Arc<AtomicU32> {
        self.opens.clone()
    }
}

impl DeviceOpener for MockOpener {
    type Transport = MockTransport;

    fn open(&mut self) -> Result<MockTransport, DeviceError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.transports
            .pop_front()
            .unwrap_or(Err(DeviceError::NoDeviceFound {
                vendor_id: protocol::wire::VENDOR_ID,
                product_id: protocol::wire::PRODUCT_ID,
            }))
    }
}

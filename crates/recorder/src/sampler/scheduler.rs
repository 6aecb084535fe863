//! Sampling worker
//!
//! Runs on a dedicated OS thread because every read blocks on USB I/O and
//! every delay is a plain sleep. Each trigger from the timer produces one
//! complete cycle; cycles never overlap and queued triggers are served in
//! order.

use crate::sampler::aggregate::{SampleBuffer, aggregate};
use crate::sink::{ReadingSink, SinkError};
use crate::usb::{DeviceOpener, SessionManager};
use chrono::Utc;
use common::TriggerReceiver;
use protocol::{DeviceError, Reading};
use std::num::NonZeroUsize;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

/// Errors that end the sampling worker
#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("failed to retrieve temperature: {0}")]
    Device(#[from] DeviceError),

    #[error("failed to record reading: {0}")]
    Sink(#[from] SinkError),

    #[error("sample buffer incomplete: {filled} of {capacity} samples")]
    IncompleteBuffer { filled: usize, capacity: usize },
}

/// Something that yields one temperature per call
pub trait TemperatureSource {
    fn read_celsius(&mut self) -> Result<f64, DeviceError>;
}

impl<O: DeviceOpener> TemperatureSource for SessionManager<O> {
    fn read_celsius(&mut self) -> Result<f64, DeviceError> {
        self.read_temperature()
    }
}

/// Timing parameters for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPlan {
    /// Time between two triggers
    pub record_period: Duration,
    /// Reads per cycle
    pub sample_count: NonZeroUsize,
    /// Sleep after each read
    pub sample_delay: Duration,
}

impl SamplingPlan {
    pub fn new(record_period: Duration, sample_count: NonZeroUsize, sample_delay: Duration) -> Self {
        Self {
            record_period,
            sample_count,
            sample_delay,
        }
    }

    /// Lower bound on how long one cycle takes
    pub fn min_cycle_duration(&self) -> Duration {
        self.sample_delay
            .saturating_mul(u32::try_from(self.sample_count.get()).unwrap_or(u32::MAX))
    }

    /// Whether cycles are expected to outlast the record period
    pub fn overruns_period(&self) -> bool {
        self.min_cycle_duration() > self.record_period
    }
}

/// Worker role of the scheduler
pub struct SamplingWorker<S, K> {
    source: S,
    sink: K,
    plan: SamplingPlan,
    buffer: SampleBuffer,
    cycles: u64,
}

impl<S: TemperatureSource, K: ReadingSink> SamplingWorker<S, K> {
    pub fn new(source: S, sink: K, plan: SamplingPlan) -> Self {
        Self {
            source,
            sink,
            buffer: SampleBuffer::new(plan.sample_count),
            plan,
            cycles: 0,
        }
    }

    /// Number of completed cycles
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Take `sample_count` readings, aggregate them and emit the result
    ///
    /// Any read error aborts the cycle before anything is emitted.
    pub fn run_cycle(&mut self) -> Result<Reading, SamplerError> {
        let timestamp = Utc::now().timestamp();
        let started = Instant::now();
        let count = self.plan.sample_count.get();

        self.buffer.clear();
        for index in 0..count {
            let celsius = self.source.read_celsius()?;
            debug!("Sample {}/{}: {:.2}°C", index + 1, count, celsius);
            self.buffer.push(celsius);
            thread::sleep(self.plan.sample_delay);
        }

        let value = aggregate(&mut self.buffer).ok_or(SamplerError::IncompleteBuffer {
            filled: self.buffer.len(),
            capacity: self.buffer.capacity(),
        })?;

        let reading = Reading::new(timestamp, value);
        self.sink.emit(&reading)?;
        self.cycles += 1;

        info!(
            "Recorded {:.2}°C (median of {} samples, cycle took {:.1?})",
            value,
            count,
            started.elapsed()
        );
        Ok(reading)
    }

    /// Serve triggers until the timer goes away or a cycle fails
    pub fn run(mut self, triggers: TriggerReceiver) -> Result<(), SamplerError> {
        info!(
            "Sampling worker started: {} samples every {:?}, {:?} apart",
            self.plan.sample_count, self.plan.record_period, self.plan.sample_delay
        );

        while let Ok(trigger) = triggers.wait() {
            debug!(
                "Trigger {} received ({} more queued)",
                trigger.sequence,
                triggers.pending()
            );

            if let Err(e) = self.run_cycle() {
                error!("Sampling cycle {} failed: {}", trigger.sequence, e);
                return Err(e);
            }
        }

        info!("Sampling worker stopped after {} cycles", self.cycles);
        Ok(())
    }
}

/// Spawn the sampling worker thread
///
/// The returned receiver resolves with the worker's exit result. It errors
/// only if the thread panicked.
pub fn spawn_sampling_worker<S, K>(
    worker: SamplingWorker<S, K>,
    triggers: TriggerReceiver,
) -> std::io::Result<oneshot::Receiver<Result<(), SamplerError>>>
where
    S: TemperatureSource + Send + 'static,
    K: ReadingSink + Send + 'static,
{
    let (done_tx, done_rx) = oneshot::channel();

    thread::Builder::new()
        .name("sampling-worker".to_string())
        .spawn(move || {
            let result = worker.run(triggers);
            let _ = done_tx.send(result);
        })?;

    Ok(done_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usb::mock::{MockOpener, MockTransport};
    use common::create_trigger_channel;
    use std::sync::{Arc, Mutex};

    struct Scripted(Vec<Result<f64, DeviceError>>);

    impl TemperatureSource for Scripted {
        fn read_celsius(&mut self) -> Result<f64, DeviceError> {
            self.0.remove(0)
        }
    }

    #[derive(Clone, Default)]
    struct Recorded(Arc<Mutex<Vec<Reading>>>);

    impl ReadingSink for Recorded {
        fn emit(&mut self, reading: &Reading) -> Result<(), SinkError> {
            self.0.lock().unwrap().push(*reading);
            Ok(())
        }
    }

    fn plan(count: usize) -> SamplingPlan {
        SamplingPlan::new(
            Duration::from_secs(300),
            NonZeroUsize::new(count).unwrap(),
            Duration::from_millis(1),
        )
    }

    #[test]
    fn test_min_cycle_duration() {
        let plan = SamplingPlan::new(
            Duration::from_secs(5),
            NonZeroUsize::new(3).unwrap(),
            Duration::from_secs(2),
        );
        assert_eq!(plan.min_cycle_duration(), Duration::from_secs(6));
        assert!(plan.overruns_period());
    }

    #[test]
    fn test_cycle_emits_median() {
        let sink = Recorded::default();
        let source = Scripted(vec![Ok(21.0), Ok(25.0), Ok(22.0)]);
        let mut worker = SamplingWorker::new(source, sink.clone(), plan(3));

        let before = Utc::now().timestamp();
        let reading = worker.run_cycle().unwrap();

        assert_eq!(reading.celsius, 22.0);
        assert!(reading.timestamp >= before);
        assert_eq!(sink.0.lock().unwrap().as_slice(), &[reading]);
        assert_eq!(worker.cycles(), 1);
    }

    #[test]
    fn test_cycle_error_emits_nothing() {
        let sink = Recorded::default();
        let source = Scripted(vec![
            Ok(21.0),
            Err(DeviceError::InterruptTransfer(protocol::UsbError::Timeout)),
        ]);
        let mut worker = SamplingWorker::new(source, sink.clone(), plan(5));

        let err = worker.run_cycle().unwrap_err();

        assert!(matches!(err, SamplerError::Device(_)));
        assert!(sink.0.lock().unwrap().is_empty());
        assert_eq!(worker.cycles(), 0);
    }

    #[test]
    fn test_worker_over_usb_session() {
        let mut transport = MockTransport::new();
        for msb in [0x16, 0x18, 0x17] {
            transport.push_response([0x80, 0x02, msb, 0x00, 0x4e, 0x20, 0x00, 0x00]);
        }
        let source = SessionManager::new(MockOpener::with_transport(transport));
        let sink = Recorded::default();
        let mut worker = SamplingWorker::new(source, sink.clone(), plan(3));

        let reading = worker.run_cycle().unwrap();

        // 22.0, 24.0, 23.0 -> 23.0
        assert_eq!(reading.celsius, 23.0);
    }

    #[test]
    fn test_run_stops_when_timer_goes_away() {
        let (mut sender, receiver) = create_trigger_channel();
        let sink = Recorded::default();
        let source = Scripted(vec![Ok(1.0), Ok(2.0)]);
        let worker = SamplingWorker::new(source, sink.clone(), plan(1));

        sender.post_blocking().unwrap();
        sender.post_blocking().unwrap();
        drop(sender);

        assert!(worker.run(receiver).is_ok());
        assert_eq!(sink.0.lock().unwrap().len(), 2);
    }
}

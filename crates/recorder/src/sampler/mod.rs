//! Sampling scheduler
//!
//! A timer task posts one trigger per record period. The worker thread
//! answers each trigger with a full sampling cycle: N spaced reads, the
//! median of those reads, and one reading handed to the sink.

pub mod aggregate;
pub mod scheduler;
pub mod timer;

pub use aggregate::{SampleBuffer, aggregate, median};
pub use scheduler::{
    SamplerError, SamplingPlan, SamplingWorker, TemperatureSource, spawn_sampling_worker,
};
pub use timer::run_timer;

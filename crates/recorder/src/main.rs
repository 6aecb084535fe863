//! temper2csv
//!
//! Periodically samples a TEMPer USB thermometer and appends the median of
//! each batch of samples to a CSV file.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use common::{create_trigger_channel, setup_logging};
use recorder::config::RecorderConfig;
use recorder::sampler::{SamplingWorker, run_timer, spawn_sampling_worker};
use recorder::sink::CsvSink;
use recorder::usb::{RusbOpener, SessionManager};
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "temper2csv")]
#[command(
    author,
    version,
    about = "Record TEMPer USB thermometer readings to a CSV file"
)]
#[command(long_about = "
Records the temperature reported by a TEMPer USB thermometer (0c45:7401).
Every record period the sensor is sampled several times and the median of
those samples is appended to the output file as \"<unix timestamp>,<celsius>\".

EXAMPLES:
    # Record every 5 minutes to temperatures.csv
    temper2csv

    # Record every minute, 3 samples one second apart, echo to the console
    temper2csv -i 60 -n 3 -t 1 -v -o ~/office.csv

CONFIGURATION:
    Settings are taken from, in increasing priority:
    1. Built-in defaults
    2. The file given with --config, else ~/.config/temper2csv/recorder.toml,
       else /etc/temper2csv/recorder.toml
    3. Command line options
")]
struct Args {
    /// Output CSV file [default: temperatures.csv]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Record period in seconds [default: 300]
    #[arg(short, long, value_name = "NUM", value_parser = clap::value_parser!(u16).range(1..))]
    interval: Option<u16>,

    /// Number of samples per record [default: 5]
    #[arg(short = 'n', long, value_name = "NUM", value_parser = clap::value_parser!(u16).range(1..))]
    samples: Option<u16>,

    /// Delay between samples in seconds [default: 2]
    #[arg(short = 't', long, value_name = "NUM", value_parser = clap::value_parser!(u16).range(1..))]
    sample_delay: Option<u16>,

    /// Print every record to the console
    #[arg(short, long)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Save the effective configuration to the default location and exit
    #[arg(long)]
    save_config: bool,

    /// Log level
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        value_parser = ["trace", "debug", "info", "warn", "error"]
    )]
    log_level: Option<String>,
}

impl Args {
    /// Layer command line options over the loaded configuration
    fn apply(&self, config: &mut RecorderConfig) {
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(interval) = self.interval {
            config.sampling.record_period_secs = interval;
        }
        if let Some(samples) = self.samples {
            config.sampling.sample_count = samples;
        }
        if let Some(delay) = self.sample_delay {
            config.sampling.sample_delay_secs = delay;
        }
        if self.verbose {
            config.output.verbose = true;
        }
        if let Some(level) = &self.log_level {
            config.recorder.log_level = level.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (to get log level from config if not specified)
    let config_path = args.config.clone().or_else(RecorderConfig::find_existing);
    let mut config = RecorderConfig::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    if args.save_config {
        let path = RecorderConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    setup_logging(&config.recorder.log_level).context("Failed to setup logging")?;

    info!("temper2csv v{}", env!("CARGO_PKG_VERSION"));
    match &config_path {
        Some(path) => info!("Loaded configuration from: {}", path.display()),
        None => info!("No configuration file found, using defaults"),
    }

    let plan = config.sampling.plan()?;
    if plan.overruns_period() {
        warn!(
            "A sampling cycle takes at least {:?}, longer than the record period of {:?}; records will queue up",
            plan.min_cycle_duration(),
            plan.record_period
        );
    }

    let output_path = config.output.expanded_path();
    let sink = CsvSink::open(&output_path, config.output.verbose)?;

    // Sensor I/O blocks, so it lives on a dedicated thread; the timer runs on
    // the runtime and feeds it through the trigger channel
    let (mut triggers, trigger_rx) = create_trigger_channel();
    let source = SessionManager::new(RusbOpener::new());
    let worker = SamplingWorker::new(source, sink, plan);
    let worker_done =
        spawn_sampling_worker(worker, trigger_rx).context("Failed to spawn sampling worker")?;

    let record_period = plan.record_period;
    let timer = tokio::spawn(async move { run_timer(&mut triggers, record_period).await });

    info!("Press Ctrl+C to stop");

    let result = tokio::select! {
        exit = worker_done => match exit {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!("{}", e);
                Err(e).context("Sampling stopped")
            }
            Err(_) => Err(anyhow!("Sampling worker thread panicked")),
        },
        ctrl_c = signal::ctrl_c() => {
            match ctrl_c {
                Ok(()) => info!("Received Ctrl+C, shutting down"),
                Err(e) => error!("Error waiting for Ctrl+C: {}", e),
            }
            Ok(())
        }
    };

    timer.abort();
    result
}

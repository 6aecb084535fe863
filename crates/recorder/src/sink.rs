//! Reading sink
//!
//! Appends one CSV line per sampling cycle and optionally echoes it to the
//! console in local time.

use chrono::{Local, TimeZone};
use protocol::Reading;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Header line written once per output file
pub const CSV_HEADER: &str = "timestamp,temperature";

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open '{path}' for writing: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to write to output file: {0}")]
    Write(#[from] io::Error),
}

/// Receives one reading per completed cycle
pub trait ReadingSink {
    fn emit(&mut self, reading: &Reading) -> Result<(), SinkError>;
}

/// CSV writer with optional console echo
pub struct CsvSink<W: Write> {
    writer: W,
    verbose: bool,
}

impl CsvSink<BufWriter<File>> {
    /// Open `path` for appending
    ///
    /// The header is written only when the file is new or empty, so
    /// restarting the recorder keeps extending the same table.
    pub fn open(path: &Path, verbose: bool) -> Result<Self, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| SinkError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let is_empty = file
            .metadata()
            .map_err(|source| SinkError::Open {
                path: path.to_path_buf(),
                source,
            })?
            .len()
            == 0;

        info!(
            "Recording to {} ({})",
            path.display(),
            if is_empty { "new file" } else { "appending" }
        );
        Self::new(BufWriter::new(file), verbose, is_empty)
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(mut writer: W, verbose: bool, write_header: bool) -> Result<Self, SinkError> {
        if write_header {
            writeln!(writer, "{}", CSV_HEADER)?;
            writer.flush()?;
        }
        Ok(Self { writer, verbose })
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }
}

impl<W: Write> ReadingSink for CsvSink<W> {
    fn emit(&mut self, reading: &Reading) -> Result<(), SinkError> {
        if self.verbose {
            println!("{}", format_console(reading));
        }

        writeln!(self.writer, "{}", format_record(reading))?;
        self.writer.flush()?;
        debug!("Wrote record for {}", reading.timestamp);
        Ok(())
    }
}

/// CSV line without the trailing newline
pub fn format_record(reading: &Reading) -> String {
    format!("{},{:.2}", reading.timestamp, reading.celsius)
}

/// Human-readable line in local time, e.g. `2024-03-01 12:00:00: 21.50°C`
pub fn format_console(reading: &Reading) -> String {
    let when = match Local.timestamp_opt(reading.timestamp, 0).single() {
        Some(time) => time.format("%F %T").to_string(),
        None => reading.timestamp.to_string(),
    };
    format!("{}: {:.2}°C", when, reading.celsius)
}

//! Recorder configuration management

use crate::sampler::SamplingPlan;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecorderConfig {
    #[serde(default)]
    pub recorder: RecorderSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub sampling: SamplingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderSettings {
    #[serde(default = "RecorderSettings::default_log_level")]
    pub log_level: String,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

impl RecorderSettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

/// Where and how readings are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// CSV file, `~` is expanded
    #[serde(default = "OutputSettings::default_path")]
    pub path: PathBuf,
    /// Echo every record on stdout
    #[serde(default)]
    pub verbose: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            verbose: false,
        }
    }
}

impl OutputSettings {
    fn default_path() -> PathBuf {
        PathBuf::from("temperatures.csv")
    }

    /// Output path with a leading `~` expanded
    pub fn expanded_path(&self) -> PathBuf {
        let raw = self.path.to_string_lossy();
        PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
    }
}

/// Sampling timing, all values in whole seconds / counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingSettings {
    /// Seconds between two records
    #[serde(default = "SamplingSettings::default_record_period")]
    pub record_period_secs: u16,
    /// Samples per record
    #[serde(default = "SamplingSettings::default_sample_count")]
    pub sample_count: u16,
    /// Seconds between two samples
    #[serde(default = "SamplingSettings::default_sample_delay")]
    pub sample_delay_secs: u16,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            record_period_secs: Self::default_record_period(),
            sample_count: Self::default_sample_count(),
            sample_delay_secs: Self::default_sample_delay(),
        }
    }
}

impl SamplingSettings {
    fn default_record_period() -> u16 {
        300 // 5 minutes
    }

    fn default_sample_count() -> u16 {
        5
    }

    fn default_sample_delay() -> u16 {
        2
    }

    /// Convert to the scheduler's plan
    pub fn plan(&self) -> Result<SamplingPlan> {
        let sample_count = NonZeroUsize::new(usize::from(self.sample_count))
            .ok_or_else(|| anyhow!("sample_count must be at least 1"))?;

        Ok(SamplingPlan::new(
            Duration::from_secs(u64::from(self.record_period_secs)),
            sample_count,
            Duration::from_secs(u64::from(self.sample_delay_secs)),
        ))
    }
}

impl RecorderConfig {
    /// Load and validate the configuration file at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: RecorderConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load `path` if given, otherwise return the built-in defaults
    ///
    /// A file that exists but cannot be loaded is an error, never a silent
    /// fallback to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// First existing file among the standard locations
    pub fn find_existing() -> Option<PathBuf> {
        Self::first_existing(&Self::search_paths())
    }

    /// Standard locations, in priority order
    pub fn search_paths() -> Vec<PathBuf> {
        vec![
            Self::default_path(),
            PathBuf::from("/etc/temper2csv/recorder.toml"),
        ]
    }

    fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
        candidates.iter().find(|p| p.exists()).cloned()
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("temper2csv").join("recorder.toml")
        } else {
            PathBuf::from(".config/temper2csv/recorder.toml")
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.recorder.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.recorder.log_level,
                valid_levels.join(", ")
            ));
        }

        let sampling = &self.sampling;
        for (name, value) in [
            ("record_period_secs", sampling.record_period_secs),
            ("sample_count", sampling.sample_count),
            ("sample_delay_secs", sampling.sample_delay_secs),
        ] {
            if value == 0 {
                return Err(anyhow!("Invalid {}: must be between 1 and {}", name, u16::MAX));
            }
        }

        if self.output.path.as_os_str().is_empty() {
            return Err(anyhow!("Output path must not be empty"));
        }

        Ok(())
    }
}

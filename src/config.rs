//! ==============================================================================
//! config.rs - sampler configuration loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `sampler.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - SensorConfig: which source to read and how to invoke it.
//!     - LogFileConfig: where the csv readings are appended.
//!     - PollingConfig: how long to sleep between samples.
//!     - LoggingConfig: tracing level and per-reading output.
//!     - PlotConfig: optional svg chart (off by default).
//!
//! every field has a default, so an empty file (or no file at all) gives the
//! classic behaviour: `vcgencmd measure_temp` -> `cpu_temp.csv` every second.
//!
//! ==============================================================================

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SamplerConfig {
    pub sensor: SensorConfig,
    pub log: LogFileConfig,
    pub polling: PollingConfig,
    pub logging: LoggingConfig,
    pub plot: PlotConfig,
}

/// Which temperature source the sampler reads.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// external utility, stdout parsed for the first decimal number
    #[default]
    Command,
    /// linux sysfs thermal zone (millidegrees)
    ThermalZone,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SensorConfig {
    pub kind: SensorKind,
    pub command: String,
    pub args: Vec<String>,
    pub thermal_zone_path: PathBuf,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            kind: SensorKind::Command,
            command: "vcgencmd".to_string(),
            args: vec!["measure_temp".to_string()],
            thermal_zone_path: PathBuf::from("/sys/class/thermal/thermal_zone0/temp"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogFileConfig {
    pub path: PathBuf,
}

impl Default for LogFileConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("cpu_temp.csv") }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub show_sensor_data: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), show_sensor_data: false }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PlotConfig {
    pub enabled: bool,
    /// readings kept on the chart; older ones scroll off
    pub capacity: usize,
    pub output: PathBuf,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            capacity: 600,
            output: PathBuf::from("cpu_temp.svg"),
        }
    }
}

impl SamplerConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse configuration from toml text
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: SamplerConfig = toml::from_str(content).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load with default fallback
    pub fn load_or_default() -> Self {
        Self::load_first_or_default(&[
            PathBuf::from("config").join("sampler.toml"),
            PathBuf::from("..").join("config").join("sampler.toml"),
        ])
    }

    /// first candidate that loads cleanly wins; broken files are skipped
    fn load_first_or_default(paths: &[PathBuf]) -> Self {
        for path in paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        tracing::info!("loaded config from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("failed to load {}: {:#}", path.display(), e);
                    }
                }
            }
        }

        tracing::info!("no config file found, using defaults");
        Self::default()
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.sensor.kind == SensorKind::Command && self.sensor.command.trim().is_empty() {
            anyhow::bail!("sensor.command must not be empty");
        }
        if self.plot.enabled && self.plot.capacity == 0 {
            anyhow::bail!("plot.capacity must be at least 1 when plotting is enabled");
        }
        Ok(())
    }

    /// Log configuration summary
    pub fn summary(&self) {
        match self.sensor.kind {
            SensorKind::Command => tracing::info!(
                "sensor: {} {}",
                self.sensor.command,
                self.sensor.args.join(" ")
            ),
            SensorKind::ThermalZone => tracing::info!(
                "sensor: thermal zone {}",
                self.sensor.thermal_zone_path.display()
            ),
        }
        tracing::info!("log file: {}", self.log.path.display());
        tracing::info!("poll interval: {}ms", self.polling.interval_ms);
        if self.plot.enabled {
            tracing::info!(
                "plot: {} (last {} readings)",
                self.plot.output.display(),
                self.plot.capacity
            );
        }
    }
}

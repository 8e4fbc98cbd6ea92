//! ==============================================================================
//! sampler.rs - the polling loop
//! ==============================================================================
//!
//! purpose:
//!     sample -> record -> (plot) -> sleep, until told to stop.
//!
//! relationships:
//!     - uses: sensor.rs (TemperatureSource, run on the blocking pool)
//!     - uses: csv_log.rs (one appended line per reading)
//!     - uses: plot.rs (optional chart)
//!     - uses: shutdown.rs (cancels the sleep between samples)
//!     - used by: main.rs
//!
//! failure policy:
//!     any error from the sensor, the log file or the chart ends the loop and
//!     is returned as-is. there is no retry and no placeholder reading.
//!
//! ==============================================================================

use crate::config::SamplerConfig;
use crate::csv_log::CsvLog;
use crate::domain::Reading;
use crate::plot::Plotter;
use crate::sensor::{self, TemperatureSource};
use crate::shutdown::ShutdownToken;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

pub struct Sampler {
    source: Arc<dyn TemperatureSource>,
    log: CsvLog,
    plotter: Option<Plotter>,
    interval: Duration,
    show_readings: bool,
}

impl Sampler {
    pub fn new(source: Arc<dyn TemperatureSource>, log: CsvLog, interval: Duration) -> Self {
        Self { source, log, plotter: None, interval, show_readings: false }
    }

    pub fn from_config(config: &SamplerConfig) -> Self {
        let mut sampler = Self::new(
            sensor::from_config(&config.sensor),
            CsvLog::new(&config.log.path),
            config.polling.interval(),
        )
        .show_readings(config.logging.show_sensor_data);
        if config.plot.enabled {
            sampler = sampler.with_plotter(Plotter::new(config.plot.capacity, &config.plot.output));
        }
        sampler
    }

    pub fn with_plotter(mut self, plotter: Plotter) -> Self {
        self.plotter = Some(plotter);
        self
    }

    /// log every reading at info instead of debug
    pub fn show_readings(mut self, show: bool) -> Self {
        self.show_readings = show;
        self
    }

    /// read the sensor once
    pub async fn sample(&self) -> Result<Reading> {
        // offload blocking io to dedicated thread
        let source = Arc::clone(&self.source);
        let value = tokio::task::spawn_blocking(move || source.sample())
            .await
            .context("sensor task join error")??;
        Ok(Reading::new(value))
    }

    pub fn record(&self, reading: &Reading) -> Result<()> {
        self.log.record(reading)
    }

    /// no-op unless a plotter is attached
    pub fn plot(&mut self, reading: Reading) -> Result<()> {
        match self.plotter.as_mut() {
            Some(plotter) => plotter.plot(reading),
            None => Ok(()),
        }
    }

    /// loop until shutdown or the first failure; returns readings written
    pub async fn run(&mut self, shutdown: ShutdownToken) -> Result<u64> {
        self.run_until(shutdown, None).await
    }

    /// like `run`, but stop after `limit` readings (no sleep after the last)
    pub async fn run_until(&mut self, mut shutdown: ShutdownToken, limit: Option<u64>) -> Result<u64> {
        let mut written = 0u64;
        tracing::debug!("appending readings to {}", self.log.path().display());

        while !shutdown.is_triggered() {
            let reading = self.sample().await?;
            self.record(&reading)?;
            self.plot(reading)?;
            written += 1;

            if self.show_readings {
                tracing::info!("[CPU] {:.1}°C at {}", reading.value, reading.timestamp);
            } else {
                tracing::debug!(value = reading.value, timestamp = %reading.timestamp, "reading recorded");
            }

            if limit.is_some_and(|n| written >= n) {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.wait() => break,
            }
        }

        tracing::info!("sampler stopped after {} readings", written);
        Ok(written)
    }
}

//! ==============================================================================
//! sensor.rs - cpu temperature sources
//! ==============================================================================
//!
//! purpose:
//!     reads the cpu temperature from the board. the default source shells out
//!     to `vcgencmd measure_temp` (prints `temp=42.8'C`) and pulls the first
//!     decimal number out of its stdout. boards without the videocore tools can
//!     read the kernel thermal zone instead.
//!
//! relationships:
//!     - used by: sampler.rs (one sample per loop iteration)
//!     - configured by: config.rs (SensorConfig)
//!
//! every failure is returned to the caller. a sensor that cannot be read never
//! reports a placeholder temperature.
//!
//! ==============================================================================

use crate::config::{SensorConfig, SensorKind};

use anyhow::{anyhow, bail, Context, Result};
use regex::Regex;
use std::path::PathBuf;
use std::process::Command;
use std::sync::{Arc, OnceLock};

/// a blocking temperature source
///
/// the sampler calls this on the blocking thread pool, so implementations are
/// free to spawn processes or touch the filesystem.
pub trait TemperatureSource: Send + Sync {
    fn sample(&self) -> Result<f64>;
}

static DECIMAL: OnceLock<Regex> = OnceLock::new();

/// extract the first `digits.digits` substring as a float
pub fn parse_temperature(text: &str) -> Result<f64> {
    let re = DECIMAL.get_or_init(|| Regex::new(r"[0-9]+\.[0-9]+").expect("decimal pattern"));
    let found = re
        .find(text)
        .ok_or_else(|| anyhow!("no decimal value in sensor output: {:?}", text.trim()))?;
    let value = found
        .as_str()
        .parse::<f64>()
        .with_context(|| format!("invalid temperature {:?}", found.as_str()))?;
    // a long enough digit run overflows to inf
    if !value.is_finite() {
        bail!("temperature out of range: {}", found.as_str());
    }
    Ok(value)
}

/// build the source selected in the config
pub fn from_config(config: &SensorConfig) -> Arc<dyn TemperatureSource> {
    match config.kind {
        SensorKind::Command => Arc::new(CommandSensor::new(&config.command, &config.args)),
        SensorKind::ThermalZone => Arc::new(ThermalZoneSensor::new(&config.thermal_zone_path)),
    }
}

// ==============================================================================
// external utility
// ==============================================================================

/// runs a sensor utility and parses its stdout
#[derive(Debug, Clone)]
pub struct CommandSensor {
    program: String,
    args: Vec<String>,
}

impl CommandSensor {
    pub fn new(program: impl Into<String>, args: &[String]) -> Self {
        Self { program: program.into(), args: args.to_vec() }
    }

    fn describe(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

impl TemperatureSource for CommandSensor {
    fn sample(&self) -> Result<f64> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        // own process group: a terminal ctrl-c stops the loop, not the sample
        // in flight
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let output = command
            .output()
            .with_context(|| format!("failed to run `{}`", self.describe()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "`{}` exited with {}: {}",
                self.describe(),
                output.status,
                stderr.trim()
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_temperature(&stdout)
    }
}

// ==============================================================================
// sysfs thermal zone
// ==============================================================================
//
// /sys/class/thermal/thermal_zone0/temp holds millidegrees celsius
// (e.g. 45000 = 45.0°C).

#[derive(Debug, Clone)]
pub struct ThermalZoneSensor {
    path: PathBuf,
}

impl ThermalZoneSensor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TemperatureSource for ThermalZoneSensor {
    fn sample(&self) -> Result<f64> {
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let millis = raw
            .trim()
            .parse::<f64>()
            .with_context(|| format!("invalid thermal zone value {:?}", raw.trim()))?;
        // f64::from_str takes "NaN" and "inf"
        if !millis.is_finite() {
            bail!("invalid thermal zone value {:?}", raw.trim());
        }
        Ok(millis / 1000.0)
    }
}

// ==============================================================================
// tests
// ==============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vcgencmd_output() {
        assert_eq!(parse_temperature("temp=46.3'C\n").unwrap(), 46.3);
        assert_eq!(parse_temperature("temp=42.8'C").unwrap(), 42.8);
    }

    #[test]
    fn test_parse_takes_first_match() {
        assert_eq!(parse_temperature("core 1: 51.0, core 2: 55.5").unwrap(), 51.0);
    }

    #[test]
    fn test_parse_ignores_integers() {
        // "1" has no decimal point, so the first match is 38.25
        assert_eq!(parse_temperature("zone 1 = 38.25").unwrap(), 38.25);
    }

    #[test]
    fn test_parse_fails_without_decimal() {
        assert!(parse_temperature("error").is_err());
        assert!(parse_temperature("temp=46'C").is_err());
        assert!(parse_temperature("").is_err());
    }

    #[test]
    fn test_parse_rejects_overflow() {
        let huge = format!("temp={}.5'C", "9".repeat(400));
        assert!(parse_temperature(&huge).is_err());
    }

    #[test]
    fn test_missing_utility_fails() {
        let sensor = CommandSensor::new("definitely-not-a-sensor-utility", &[]);
        let err = sensor.sample().unwrap_err();
        assert!(format!("{:#}", err).contains("failed to run"));
    }

    #[cfg(unix)]
    fn sh(script: &str) -> CommandSensor {
        CommandSensor::new("sh", &["-c".to_string(), script.to_string()])
    }

    #[cfg(unix)]
    #[test]
    fn test_command_stdout_is_parsed() {
        assert_eq!(sh("echo \"temp=46.3'C\"").sample().unwrap(), 46.3);
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_fails_with_stderr() {
        let err = sh("echo 'temp=46.3' ; echo 'VCHI init failed' >&2 ; exit 3")
            .sample()
            .unwrap_err();
        assert!(err.to_string().contains("VCHI init failed"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_utility_runs_in_its_own_process_group() {
        // field 5 of /proc/<pid>/stat is the process group id
        let sensor = sh("set -- $(cat /proc/$$/stat); [ \"$5\" = \"$$\" ] && echo \"temp=40.5'C\"");
        assert_eq!(sensor.sample().unwrap(), 40.5);
    }

    #[cfg(unix)]
    #[test]
    fn test_unparseable_stdout_fails() {
        assert!(sh("echo error").sample().is_err());
    }

    #[test]
    fn test_thermal_zone_millidegrees() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        std::fs::write(&path, "45123\n").unwrap();
        let value = ThermalZoneSensor::new(&path).sample().unwrap();
        assert!((value - 45.123).abs() < 1e-9);
    }

    #[test]
    fn test_thermal_zone_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("temp");
        assert!(ThermalZoneSensor::new(&path).sample().is_err());
        for junk in ["n/a\n", "NaN\n", "inf\n", "-infinity\n"] {
            std::fs::write(&path, junk).unwrap();
            assert!(ThermalZoneSensor::new(&path).sample().is_err(), "accepted {:?}", junk);
        }
    }
}

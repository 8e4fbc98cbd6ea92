//! append-only csv log of readings
//!
//! the file is opened, appended and closed once per reading. nothing is
//! buffered between iterations, so a crash loses at most the reading in flight.

use crate::domain::Reading;

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct CsvLog {
    path: PathBuf,
}

impl CsvLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// append one `timestamp,value` line
    pub fn record(&self, reading: &Reading) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;

        // single write so the line lands whole
        file.write_all(reading.csv_line().as_bytes())
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading(second: u32, value: f64) -> Reading {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(23, 59, second)
            .unwrap();
        Reading::at(ts, value)
    }

    #[test]
    fn test_record_appends() {
        let dir = tempfile::tempdir().unwrap();
        let log = CsvLog::new(dir.path().join("cpu_temp.csv"));

        log.record(&reading(1, 46.3)).unwrap();
        let first_len = std::fs::metadata(log.path()).unwrap().len();
        log.record(&reading(2, 47.8)).unwrap();
        let second_len = std::fs::metadata(log.path()).unwrap().len();

        assert!(second_len > first_len);
        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content, "2024-01-31 23:59:01,46.3\n2024-01-31 23:59:02,47.8\n");
    }

    #[test]
    fn test_existing_content_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cpu_temp.csv");
        std::fs::write(&path, "2023-12-31 00:00:00,40.0\n").unwrap();

        CsvLog::new(&path).record(&reading(5, 41.5)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "2023-12-31 00:00:00,40.0\n2024-01-31 23:59:05,41.5\n");
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let log = CsvLog::new(dir.path().join("missing").join("cpu_temp.csv"));
        let err = log.record(&reading(0, 40.0)).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to open"));
    }
}

use chrono::{Local, NaiveDateTime, Timelike};

/// wall clock format of the csv timestamp column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// one temperature sample
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// local wall clock time, whole seconds
    pub timestamp: NaiveDateTime,
    /// degrees celsius as reported by the sensor
    pub value: f64,
}

impl Reading {
    /// stamp a value with the current local time
    pub fn new(value: f64) -> Self {
        Self::at(Local::now().naive_local(), value)
    }

    pub fn at(timestamp: NaiveDateTime, value: f64) -> Self {
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        Self { timestamp, value }
    }

    /// `timestamp,value` followed by a newline
    ///
    /// `{:?}` keeps the decimal point on whole numbers (45.0, not 45).
    pub fn csv_line(&self) -> String {
        format!("{},{:?}\n", self.timestamp.format(TIMESTAMP_FORMAT), self.value)
    }
}

//! Calendar parts extracted from transaction timestamps

use crate::error::{Result, SalesError};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

// Slash dates are month-first, like the pandas default.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Year, month, day and day-of-week of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarFeatures {
    pub year: i32,
    /// 1..=12
    pub month: u32,
    /// 1..=31
    pub day: u32,
    /// Monday = 0 .. Sunday = 6
    pub day_of_week: u32,
}

impl CalendarFeatures {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
            day_of_week: date.weekday().num_days_from_monday(),
        }
    }

    /// Parse a raw timestamp and extract its calendar parts
    pub fn parse(raw: &str) -> Result<Self> {
        parse_date(raw).map(Self::from_date)
    }

    pub fn as_array(&self) -> [f64; 4] {
        [
            self.year as f64,
            self.month as f64,
            self.day as f64,
            self.day_of_week as f64,
        ]
    }
}

/// Parse the date part of a timestamp.
///
/// Offset-aware timestamps keep their local calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(SalesError::MalformedInput("timestamp is empty".to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }

    Err(SalesError::MalformedInput(format!(
        "unparsable timestamp '{}'",
        raw
    )))
}

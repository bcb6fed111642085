//! Calendar date helpers for form fields and query parameters
//!
//! Dates travel as plain `YYYY-MM-DD` strings. Parsing pulls the three
//! components out of the string and builds a `NaiveDate` from them directly,
//! so no timezone is involved anywhere between storage and redisplay.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("date pattern is valid")
});

/// Date parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateParseError {
    #[error("Date must be in format YYYY-MM-DD, got {0:?}")]
    Format(String),

    #[error("Not a calendar date: {0}")]
    OutOfRange(String),
}

/// Parse a `YYYY-MM-DD` string into a calendar date.
///
/// Month and day may be unpadded (`2025-8-4`), which is what a hand-edited
/// URL tends to contain. The result is always formatted back zero-padded.
pub fn parse_date(input: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = input.trim();
    let captures = DATE_PATTERN
        .captures(trimmed)
        .ok_or_else(|| DateParseError::Format(input.to_string()))?;

    let component = |i: usize| -> Result<u32, DateParseError> {
        captures[i]
            .parse::<u32>()
            .map_err(|_| DateParseError::Format(input.to_string()))
    };

    let year = component(1)? as i32;
    let month = component(2)?;
    let day = component(3)?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateParseError::OutOfRange(trimmed.to_string()))
}

/// Format a date as zero-padded `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Weekday index with Sunday = 0 ... Saturday = 6.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

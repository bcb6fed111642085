//! Destination directory and the weekday availability predicate
//!
//! Every bookable city flies only on certain weekdays. The directory is
//! loaded once (built-in demo list or a JSON file) and never mutated.

use crate::dates::weekday_index;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Destination directory errors
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Failed to read destinations file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid destinations JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Destination code must not be empty")]
    EmptyCode,

    #[error("Duplicate destination code: {0}")]
    DuplicateCode(String),

    #[error("Destination {code} has weekday {day}, expected 0-6")]
    InvalidWeekday { code: String, day: u8 },

    #[error("Unknown destination code: {0}")]
    UnknownCode(String),

    #[error("Cannot scan {days} days, at most {max} allowed")]
    ScanTooLong { days: u32, max: u32 },
}

/// Longest window `available_dates` will enumerate
pub const MAX_SCAN_DAYS: u32 = 366;

/// Canonical form of a city code as typed by a user or read from a URL
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// A bookable city
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub code: String,
    pub city: String,
    /// Sunday = 0 ... Saturday = 6
    pub available_weekdays: BTreeSet<u8>,
}

impl Destination {
    pub fn new(code: &str, city: &str, weekdays: &[u8]) -> Self {
        Self {
            code: code.to_string(),
            city: city.to_string(),
            available_weekdays: weekdays.iter().copied().collect(),
        }
    }

    /// Whether flights leave on the weekday of `date`.
    pub fn flies_on(&self, date: NaiveDate) -> bool {
        self.available_weekdays.contains(&weekday_index(date))
    }
}

/// Ordering constraint against the other date of a round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    None,
    /// Departure picker: must not be after the held return date
    NotAfter(NaiveDate),
    /// Return picker: must not be before the held departure date
    NotBefore(NaiveDate),
}

/// Static list of destinations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationDirectory {
    destinations: Vec<Destination>,
}

impl DestinationDirectory {
    /// Build a directory, checking codes are unique and weekdays are in range
    pub fn new(destinations: Vec<Destination>) -> Result<Self, DirectoryError> {
        let mut seen = HashSet::new();
        for destination in &destinations {
            if destination.code.trim().is_empty() {
                return Err(DirectoryError::EmptyCode);
            }
            if !seen.insert(destination.code.as_str()) {
                return Err(DirectoryError::DuplicateCode(destination.code.clone()));
            }
            if let Some(&day) = destination.available_weekdays.iter().find(|&&d| d > 6) {
                return Err(DirectoryError::InvalidWeekday {
                    code: destination.code.clone(),
                    day,
                });
            }
        }

        debug!(destinations = destinations.len(), "Destination directory built");
        Ok(Self { destinations })
    }

    /// The demo airline's route map
    pub fn builtin() -> Self {
        Self {
            destinations: vec![
                Destination::new("NYC", "New York", &[1, 3, 5]),
                Destination::new("LON", "London", &[2, 4, 6]),
                Destination::new("PAR", "Paris", &[0, 2, 4]),
                Destination::new("TYO", "Tokyo", &[1, 5]),
                Destination::new("DXB", "Dubai", &[0, 1, 2, 3, 4, 5, 6]),
            ],
        }
    }

    /// Parse a JSON array of destinations
    pub fn from_json_str(json: &str) -> Result<Self, DirectoryError> {
        let destinations: Vec<Destination> = serde_json::from_str(json)?;
        Self::new(destinations)
    }

    /// Load a JSON array of destinations from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let directory = Self::from_json_str(&contents)?;
        info!(
            path = %path.display(),
            destinations = directory.destinations.len(),
            "Loaded destination directory"
        );
        Ok(directory)
    }

    pub fn get(&self, code: &str) -> Option<&Destination> {
        self.destinations.iter().find(|d| d.code == code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// Availability predicate.
    ///
    /// With no city chosen, or a code that is not in the directory, every
    /// date counts as available so selection is never blocked up front.
    pub fn is_day_available(&self, date: NaiveDate, city_code: Option<&str>) -> bool {
        match city_code.and_then(|code| self.get(code)) {
            Some(destination) => destination.flies_on(date),
            None => true,
        }
    }

    /// Date-picker rule: available for the city, not in the past, and on the
    /// right side of the other leg's date.
    pub fn is_selectable(
        &self,
        date: NaiveDate,
        city_code: Option<&str>,
        today: NaiveDate,
        bound: DateBound,
    ) -> bool {
        if date < today || !self.is_day_available(date, city_code) {
            return false;
        }
        match bound {
            DateBound::None => true,
            DateBound::NotAfter(limit) => date <= limit,
            DateBound::NotBefore(limit) => date >= limit,
        }
    }

    /// Flyable dates for a city within `days` days starting at `from`.
    /// `days` is capped at [`MAX_SCAN_DAYS`].
    pub fn available_dates(
        &self,
        city_code: &str,
        from: NaiveDate,
        days: u32,
    ) -> Result<Vec<NaiveDate>, DirectoryError> {
        if days > MAX_SCAN_DAYS {
            return Err(DirectoryError::ScanTooLong {
                days,
                max: MAX_SCAN_DAYS,
            });
        }

        let destination = self
            .get(city_code)
            .ok_or_else(|| DirectoryError::UnknownCode(city_code.to_string()))?;

        Ok(from
            .iter_days()
            .take(days as usize)
            .filter(|date| destination.flies_on(*date))
            .collect())
    }
}

impl Default for DestinationDirectory {
    fn default() -> Self {
        Self::builtin()
    }
}

//! # Airline Booking Library
//!
//! Form state, validation and submission for the Digido Airlines booking form.
//! A trip draft is edited one change at a time, mirrored into URL query
//! parameters, validated and finally forwarded to the remote booking API.

pub mod client;
pub mod config;
pub mod dates;
pub mod destination;
pub mod form;
pub mod query;
pub mod validation;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// Re-export main types for convenience
pub use client::{BookingClient, BookingConfirmation, BookingPayload, BookingResult};
pub use config::{BookingConfig, ConfigError};
pub use dates::{format_date, parse_date, weekday_index, DateParseError};
pub use destination::{
    normalize_code, DateBound, Destination, DestinationDirectory, DirectoryError, MAX_SCAN_DAYS,
};
pub use form::{reconcile, reconcile_all, BookingForm, FormChange, FormInput, Reconciled, TripDraft, Warning};
pub use validation::{validate, TripRequest, ValidationError};

/// Error types for the booking library
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Booking API returned {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("JSON processing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid date: {0}")]
    DateParseError(#[from] DateParseError),

    #[error("Invalid trip type: {0}")]
    InvalidTripType(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Destination directory error: {0}")]
    DirectoryError(#[from] DirectoryError),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("{0}")]
    ValidationError(#[from] ValidationError),
}

/// Trip type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
    #[default]
    RoundTrip,
    OneWay,
}

impl TripType {
    /// Value used in query parameters and the booking payload
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::RoundTrip => "roundtrip",
            TripType::OneWay => "oneway",
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripType {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "round-trip" | "roundtrip" => Ok(TripType::RoundTrip),
            "one-way" | "oneway" => Ok(TripType::OneWay),
            _ => Err(BookingError::InvalidTripType(s.to_string())),
        }
    }
}

/// Validate a draft and submit it in one call.
///
/// Validation failures come back as `Err` without touching the network.
/// Remote failures are not errors: they are collapsed into
/// `BookingResult::Failure` and the cause is logged.
///
/// # Example
/// ```rust,no_run
/// use airline_booking::{book_flight, BookingConfig, DestinationDirectory, TripDraft, TripType, parse_date};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let directory = DestinationDirectory::builtin();
/// let draft = TripDraft {
///     origin: Some("NYC".to_string()),
///     destination: Some("LON".to_string()),
///     trip_type: TripType::OneWay,
///     departure_date: Some(parse_date("2025-08-18")?),
///     return_date: None,
/// };
///
/// let result = book_flight(BookingConfig::from_env()?, &directory, &draft).await?;
/// println!("{}", serde_json::to_string(&result)?);
/// # Ok(())
/// # }
/// ```
pub async fn book_flight(
    config: BookingConfig,
    directory: &DestinationDirectory,
    draft: &TripDraft,
) -> Result<BookingResult, BookingError> {
    let request = validate(directory, draft)?;
    let client = BookingClient::new(config)?;
    Ok(client.book(&request).await)
}

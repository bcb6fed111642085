//! Pre-flight checks run before a draft is sent to the booking API

use crate::dates::format_date;
use crate::destination::DestinationDirectory;
use crate::form::TripDraft;
use crate::TripType;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

/// Reasons a draft cannot be submitted, in the order they are checked
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select both origin and destination.")]
    MissingCities,

    #[error("Origin and destination cannot be the same.")]
    SameCities,

    #[error("Please select a departure date.")]
    MissingDepartureDate,

    #[error("Please select a return date.")]
    MissingReturnDate,

    #[error("There are no flights from {origin} on {date}.")]
    DepartureUnavailable { origin: String, date: String },

    #[error("There are no flights from {destination} on {date}.")]
    ReturnUnavailable { destination: String, date: String },

    #[error("Return date cannot be before the departure date.")]
    ReturnBeforeDeparture,
}

/// A draft that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRequest {
    pub origin: String,
    pub destination: String,
    pub trip_type: TripType,
    pub departure_date: NaiveDate,
    /// Only ever set for round trips
    pub return_date: Option<NaiveDate>,
}

/// Check a draft, stopping at the first problem.
///
/// The four form checks come first so their order is what a user sees. The
/// availability checks after them catch dates that never went through the
/// date picker (e.g. typed into the URL).
pub fn validate(directory: &DestinationDirectory, draft: &TripDraft) -> Result<TripRequest, ValidationError> {
    let (origin, destination) = match (draft.origin.as_deref(), draft.destination.as_deref()) {
        (Some(origin), Some(destination)) if !origin.is_empty() && !destination.is_empty() => {
            (origin, destination)
        }
        _ => return Err(ValidationError::MissingCities),
    };

    if origin == destination {
        return Err(ValidationError::SameCities);
    }

    let departure_date = draft.departure_date.ok_or(ValidationError::MissingDepartureDate)?;

    let return_date = match draft.trip_type {
        TripType::RoundTrip => Some(draft.return_date.ok_or(ValidationError::MissingReturnDate)?),
        TripType::OneWay => None,
    };

    if !directory.is_day_available(departure_date, Some(origin)) {
        return Err(ValidationError::DepartureUnavailable {
            origin: origin.to_string(),
            date: format_date(departure_date),
        });
    }

    if let Some(return_date) = return_date {
        if !directory.is_day_available(return_date, Some(destination)) {
            return Err(ValidationError::ReturnUnavailable {
                destination: destination.to_string(),
                date: format_date(return_date),
            });
        }
        if return_date < departure_date {
            return Err(ValidationError::ReturnBeforeDeparture);
        }
    }

    debug!(origin, destination, trip_type = %draft.trip_type, "Draft passed validation");

    Ok(TripRequest {
        origin: origin.to_string(),
        destination: destination.to_string(),
        trip_type: draft.trip_type,
        departure_date,
        return_date,
    })
}

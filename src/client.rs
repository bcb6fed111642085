//! HTTP client for the remote booking API

use crate::config::BookingConfig;
use crate::dates::format_date;
use crate::validation::TripRequest;
use crate::{BookingError, TripType};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, error, info, instrument};

/// Header carrying the static API key
pub const AUTH_HEADER: &str = "x-auth-key";

/// Message returned for every remote failure
pub const BOOKING_FAILED: &str = "Booking failed";

/// JSON body sent to the booking API
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPayload {
    pub origin: String,
    pub destination: String,
    #[serde(rename = "type")]
    pub trip_type: TripType,
    pub departure_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_date: Option<String>,
}

impl From<&TripRequest> for BookingPayload {
    fn from(request: &TripRequest) -> Self {
        let return_date = match request.trip_type {
            TripType::RoundTrip => request.return_date.map(format_date),
            TripType::OneWay => None,
        };

        Self {
            origin: request.origin.clone(),
            destination: request.destination.clone(),
            trip_type: request.trip_type,
            departure_date: format_date(request.departure_date),
            return_date,
        }
    }
}

/// Fields read back from a successful booking response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub booking_id: String,
    pub status: String,
    pub timestamp: String,
}

/// Outcome of one submission attempt.
///
/// Serializes as `{"success": true, "bookingId", "status", "timestamp"}` or
/// `{"success": false, "error"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingResult {
    Success(BookingConfirmation),
    Failure { error: String },
}

impl BookingResult {
    pub fn failed() -> Self {
        BookingResult::Failure {
            error: BOOKING_FAILED.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BookingResult::Success(_))
    }
}

impl Serialize for BookingResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BookingResult::Success(confirmation) => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("bookingId", &confirmation.booking_id)?;
                map.serialize_entry("status", &confirmation.status)?;
                map.serialize_entry("timestamp", &confirmation.timestamp)?;
                map.end()
            }
            BookingResult::Failure { error } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}

/// Client for submitting bookings
pub struct BookingClient {
    http_client: Client,
    config: BookingConfig,
}

impl BookingClient {
    /// Create a new booking client
    pub fn new(config: BookingConfig) -> Result<Self, BookingError> {
        debug!(endpoint = %config.endpoint, "Creating booking client");
        let http_client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { http_client, config })
    }

    pub fn config(&self) -> &BookingConfig {
        &self.config
    }

    /// Submit a validated trip.
    ///
    /// Never returns an error: transport failures, non-2xx responses and
    /// unreadable bodies are logged and become `BookingResult::failed()`.
    #[instrument(
        level = "info",
        skip(self, request),
        fields(origin = %request.origin, destination = %request.destination, trip_type = %request.trip_type)
    )]
    pub async fn book(&self, request: &TripRequest) -> BookingResult {
        match self.send(request).await {
            Ok(confirmation) => {
                info!(
                    booking_id = %confirmation.booking_id,
                    status = %confirmation.status,
                    "Booking confirmed"
                );
                BookingResult::Success(confirmation)
            }
            Err(e) => {
                error!(error = %e, "Booking failed");
                BookingResult::failed()
            }
        }
    }

    async fn send(&self, request: &TripRequest) -> Result<BookingConfirmation, BookingError> {
        let payload = BookingPayload::from(request);
        debug!(?payload, "Built booking payload");

        let start_time = std::time::Instant::now();
        let response = self
            .http_client
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTH_HEADER, &self.config.api_key)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();

        info!(
            status = %status,
            duration_ms = start_time.elapsed().as_millis(),
            "Booking request completed"
        );

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BookingError::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

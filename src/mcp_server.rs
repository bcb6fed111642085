// src/mcp_server.rs

use airline_booking::{
    format_date, parse_date, BookingClient, BookingConfig, BookingForm, DestinationDirectory,
    FormInput,
};
use anyhow::Result;
use chrono::Local;
use rmcp::{
    model::{ServerCapabilities, ServerInfo},
    schemars, tool,
    transport::stdio,
    ServerHandler, ServiceExt,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Booking MCP server
#[derive(Clone)]
pub struct BookingServer {
    directory: Arc<DestinationDirectory>,
    client: Option<Arc<BookingClient>>,
}

impl BookingServer {
    pub fn new(directory: DestinationDirectory, client: Option<BookingClient>) -> Self {
        Self {
            directory: Arc::new(directory),
            client: client.map(Arc::new),
        }
    }

    /// Initialize logging to file
    fn init_logging() -> Result<()> {
        let log_dir = PathBuf::from("logs");
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = tracing_appender::rolling::daily(&log_dir, "airline-booking-mcp.log");

        // stdout carries the protocol, so everything goes to the file
        tracing_subscriber::registry()
            .with(
                EnvFilter::new("info")
                    .add_directive("airline_booking=debug".parse()?)
                    .add_directive("airline_booking_mcp=debug".parse()?),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .json(),
            )
            .init();

        info!("Logging initialized - logs will be written to logs/airline-booking-mcp.log.*");
        Ok(())
    }
}

/// Availability lookup parameters
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct AvailabilityParams {
    #[schemars(description = "City code (e.g., NYC, LON)")]
    pub city: String,
    #[schemars(description = "First date to consider in YYYY-MM-DD format (default: today)")]
    pub from: Option<String>,
    #[schemars(description = "Number of days to scan (default: 28, max: 366)")]
    pub days: Option<u32>,
}

/// Booking parameters, mirroring the booking form fields
#[derive(Debug, Deserialize, Clone, schemars::JsonSchema)]
pub struct BookFlightParams {
    #[schemars(description = "Optional query string or URL with previously saved form state")]
    pub query: Option<String>,
    #[schemars(description = "Origin city code (e.g., NYC)")]
    pub origin: Option<String>,
    #[schemars(description = "Destination city code (e.g., LON)")]
    pub destination: Option<String>,
    #[schemars(description = "Trip type: roundtrip or oneway (default: roundtrip)")]
    pub trip_type: Option<String>,
    #[schemars(description = "Departure date in YYYY-MM-DD format")]
    pub departure_date: Option<String>,
    #[schemars(description = "Return date in YYYY-MM-DD format, round trips only")]
    pub return_date: Option<String>,
}

impl From<BookFlightParams> for FormInput {
    fn from(params: BookFlightParams) -> Self {
        Self {
            query: params.query,
            trip_type: params.trip_type,
            origin: params.origin,
            destination: params.destination,
            departure_date: params.departure_date,
            return_date: params.return_date,
        }
    }
}

fn error_json(message: impl std::fmt::Display) -> String {
    serde_json::json!({ "error": message.to_string() }).to_string()
}

#[tool(tool_box)]
impl BookingServer {
    /// List bookable cities
    #[tool(description = "List all destinations with their codes and the weekdays (0 = Sunday ... 6 = Saturday) on which flights operate.")]
    async fn list_destinations(&self) -> String {
        info!(destinations = self.directory.destinations().len(), "Destination list requested");
        serde_json::to_string_pretty(self.directory.destinations())
            .unwrap_or_else(|e| error_json(format!("Failed to serialize destinations: {}", e)))
    }

    /// Dates with flights for one city
    #[tool(description = "List the dates on which a city has flights, starting from a given date.")]
    async fn check_availability(
        &self,
        #[tool(aggr)] params: AvailabilityParams,
    ) -> String {
        info!(
            city = params.city,
            from = params.from.as_deref(),
            days = params.days.unwrap_or(28),
            "Availability request received"
        );

        let from = match params.from.as_deref().map(parse_date).transpose() {
            Ok(from) => from.unwrap_or_else(|| Local::now().date_naive()),
            Err(e) => {
                warn!(error = %e, "Invalid start date");
                return error_json(format!("Invalid start date: {}", e));
            }
        };

        let city = params.city.trim().to_uppercase();
        match self.directory.available_dates(&city, from, params.days.unwrap_or(28)) {
            Ok(dates) => {
                debug!(city = city, dates = dates.len(), "Availability computed");
                serde_json::json!({
                    "city": city,
                    "dates": dates.into_iter().map(format_date).collect::<Vec<_>>(),
                })
                .to_string()
            }
            Err(e) => {
                warn!(error = %e, "Availability lookup failed");
                error_json(e)
            }
        }
    }

    /// Validate and submit a booking
    #[tool(description = "Book a flight. Fields are applied like the booking form: trip type, origin, destination, departure date, return date. Returns form warnings and the booking result.")]
    async fn book_flight(
        &self,
        #[tool(aggr)] params: BookFlightParams,
    ) -> String {
        info!(
            origin = params.origin.as_deref(),
            destination = params.destination.as_deref(),
            trip_type = params.trip_type.as_deref().unwrap_or("roundtrip"),
            departure_date = params.departure_date.as_deref(),
            return_date = params.return_date.as_deref(),
            "Booking request received"
        );

        let Some(client) = self.client.as_ref() else {
            error!("Booking requested but the booking API is not configured");
            return error_json("Booking API is not configured (set BOOKING_API_KEY)");
        };

        let (mut form, warnings) =
            match BookingForm::from_input((*self.directory).clone(), &params.into()) {
                Ok(filled) => filled,
                Err(e) => {
                    warn!(error = %e, "Invalid booking input");
                    return error_json(e);
                }
            };

        let warnings: Vec<String> = warnings.iter().map(ToString::to_string).collect();
        let query = form.to_query();

        match form.submit(client).await {
            Ok(result) => {
                info!(success = result.is_success(), "Booking submission finished");
                serde_json::json!({
                    "warnings": warnings,
                    "query": query,
                    "result": result,
                })
                .to_string()
            }
            Err(e) => {
                warn!(error = %e, "Booking form did not validate");
                serde_json::json!({
                    "warnings": warnings,
                    "query": query,
                    "error": e.to_string(),
                })
                .to_string()
            }
        }
    }
}

#[tool(tool_box)]
impl ServerHandler for BookingServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Digido Airlines booking server. Use list_destinations and check_availability to find flyable dates, then book_flight to submit a booking.".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

fn load_directory() -> Result<DestinationDirectory> {
    match std::env::var("BOOKING_DESTINATIONS") {
        Ok(path) if !path.trim().is_empty() => Ok(DestinationDirectory::from_path(path.trim())?),
        _ => Ok(DestinationDirectory::builtin()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = BookingServer::init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    info!("Starting MCP Booking Server");

    let directory = load_directory()?;
    let client = match BookingConfig::from_env() {
        Ok(config) => Some(BookingClient::new(config)?),
        Err(e) => {
            warn!(error = %e, "Booking API not configured, book_flight will be unavailable");
            None
        }
    };

    let server = BookingServer::new(directory, client);
    let transport = stdio();

    let service = server.serve(transport).await?;
    info!("MCP service started, waiting for requests");

    service.waiting().await?;

    info!("MCP service shutting down");
    Ok(())
}

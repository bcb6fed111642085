//! Booking API configuration
//!
//! Read from the process environment once and handed to
//! [`BookingClient::new`](crate::BookingClient::new).
//!
//! | Variable               | Required | Default                                              |
//! |------------------------|----------|------------------------------------------------------|
//! | `BOOKING_API_KEY`      | yes      |                                                      |
//! | `BOOKING_API_URL`      | no       | `https://airline-booking-nine.vercel.app/api/booking` |
//! | `BOOKING_TIMEOUT_SECS` | no       | `10`                                                 |

use reqwest::Url;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://airline-booking-nine.vercel.app/api/booking";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const API_KEY_VAR: &str = "BOOKING_API_KEY";
pub const ENDPOINT_VAR: &str = "BOOKING_API_URL";
pub const TIMEOUT_VAR: &str = "BOOKING_TIMEOUT_SECS";

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("BOOKING_API_KEY is not set")]
    MissingApiKey,

    #[error("BOOKING_API_URL is not a valid URL: {0}")]
    InvalidEndpoint(String),

    #[error("BOOKING_TIMEOUT_SECS must be a positive whole number of seconds, got {0:?}")]
    InvalidTimeout(String),
}

/// Settings for the outbound booking request
#[derive(Clone, PartialEq, Eq)]
pub struct BookingConfig {
    pub endpoint: String,
    /// Sent verbatim as the `x-auth-key` header
    pub api_key: String,
    pub timeout: Duration,
}

impl BookingConfig {
    /// Default endpoint and timeout with the given key.
    ///
    /// No check is made on `api_key`; an empty key is sent as an empty header.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load from the process environment. A missing or empty API key is an
    /// error here, at startup, instead of a rejected request later.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = Self::new(api_key);

        if let Some(endpoint) = lookup(ENDPOINT_VAR).filter(|e| !e.trim().is_empty()) {
            let url = Url::parse(endpoint.trim())
                .map_err(|e| ConfigError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidEndpoint(endpoint));
            }
            config.endpoint = url.to_string();
        }

        if let Some(timeout) = lookup(TIMEOUT_VAR).filter(|t| !t.trim().is_empty()) {
            let secs = timeout
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|&secs| secs > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout(timeout.clone()))?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

// Keep the key out of logs
impl fmt::Debug for BookingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookingConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

//! URL query parameter mapping for [`TripDraft`]
//!
//! Parameter contract: `origin`, `destination`, `type` (`roundtrip` |
//! `oneway`, default `roundtrip`), `departureDate`, `returnDate`
//! (`YYYY-MM-DD`). Cleared fields have no parameter at all; `type` is always
//! written.

use crate::dates::{format_date, parse_date};
use crate::destination::normalize_code;
use crate::form::{TripDraft, Warning};
use crate::{BookingError, TripType};
use regex::Regex;
use reqwest::Url;
use std::sync::LazyLock;
use tracing::warn;

pub const ORIGIN_PARAM: &str = "origin";
pub const DESTINATION_PARAM: &str = "destination";
pub const TYPE_PARAM: &str = "type";
pub const DEPARTURE_DATE_PARAM: &str = "departureDate";
pub const RETURN_DATE_PARAM: &str = "returnDate";

const FORM_PARAMS: [&str; 5] = [
    ORIGIN_PARAM,
    DESTINATION_PARAM,
    TYPE_PARAM,
    DEPARTURE_DATE_PARAM,
    RETURN_DATE_PARAM,
];

// Base for bare query strings so they can go through the same Url parser
static QUERY_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://localhost/").expect("query base URL is valid"));

// A scheme has to open the input; `://` inside a parameter value does not count
static SCHEME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://").expect("scheme regex is valid"));

impl TripDraft {
    /// Read form state from a bare query string (`origin=NYC&type=oneway`,
    /// with or without a leading `?`) or from a full URL.
    ///
    /// Unparseable dates and trip types are dropped with a warning rather than
    /// failing, like a browser form ignoring a bad parameter.
    pub fn from_query(query: &str) -> Result<(Self, Vec<Warning>), BookingError> {
        let url = if SCHEME_PREFIX.is_match(query.trim_start()) {
            Url::parse(query.trim()).map_err(|e| BookingError::InvalidUrl(format!("{query}: {e}")))?
        } else {
            let mut url = QUERY_BASE.clone();
            url.set_query(Some(query.trim_start_matches('?')));
            url
        };
        Ok(Self::from_url(&url))
    }

    /// Read form state from the query parameters of `url`.
    pub fn from_url(url: &Url) -> (Self, Vec<Warning>) {
        let mut draft = TripDraft::default();
        let mut warnings = Vec::new();

        for (key, value) in url.query_pairs() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                ORIGIN_PARAM => draft.origin = Some(normalize_code(value)),
                DESTINATION_PARAM => draft.destination = Some(normalize_code(value)),
                TYPE_PARAM => match value.parse::<TripType>() {
                    Ok(trip_type) => draft.trip_type = trip_type,
                    Err(_) => {
                        warn!(value = value, "Unknown trip type in query");
                        warnings.push(Warning::UnknownTripType(value.to_string()));
                    }
                },
                DEPARTURE_DATE_PARAM => match parse_date(value) {
                    Ok(date) => draft.departure_date = Some(date),
                    Err(e) => {
                        warn!(error = %e, "Ignoring departure date from query");
                        warnings.push(Warning::MalformedDate {
                            field: DEPARTURE_DATE_PARAM,
                            value: value.to_string(),
                        });
                    }
                },
                RETURN_DATE_PARAM => match parse_date(value) {
                    Ok(date) => draft.return_date = Some(date),
                    Err(e) => {
                        warn!(error = %e, "Ignoring return date from query");
                        warnings.push(Warning::MalformedDate {
                            field: RETURN_DATE_PARAM,
                            value: value.to_string(),
                        });
                    }
                },
                _ => {}
            }
        }

        (draft, warnings)
    }

    /// Form parameters in their canonical order
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(FORM_PARAMS.len());
        if let Some(origin) = &self.origin {
            pairs.push((ORIGIN_PARAM, origin.clone()));
        }
        if let Some(destination) = &self.destination {
            pairs.push((DESTINATION_PARAM, destination.clone()));
        }
        pairs.push((TYPE_PARAM, self.trip_type.as_str().to_string()));
        if let Some(departure) = self.departure_date {
            pairs.push((DEPARTURE_DATE_PARAM, format_date(departure)));
        }
        if let Some(return_date) = self.return_date {
            pairs.push((RETURN_DATE_PARAM, format_date(return_date)));
        }
        pairs
    }

    /// Encoded query string, without the leading `?`.
    pub fn to_query(&self) -> String {
        let mut url = QUERY_BASE.clone();
        url.query_pairs_mut().extend_pairs(self.query_pairs());
        url.query().unwrap_or_default().to_string()
    }

    /// Write form state into `url`, replacing any previous form parameters
    /// and keeping unrelated ones.
    pub fn apply_to_url(&self, url: &mut Url) {
        let others: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !FORM_PARAMS.contains(&key.as_ref()))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(others)
            .extend_pairs(self.query_pairs());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;

    #[test]
    fn test_to_query_omits_cleared_fields() {
        let draft = TripDraft {
            origin: Some("NYC".into()),
            destination: None,
            trip_type: TripType::OneWay,
            departure_date: Some(parse_date("2025-08-18").unwrap()),
            return_date: None,
        };
        assert_eq!(draft.to_query(), "origin=NYC&type=oneway&departureDate=2025-08-18");
    }

    #[test]
    fn test_empty_draft_still_writes_type() {
        assert_eq!(TripDraft::default().to_query(), "type=roundtrip");
    }

    #[test]
    fn test_from_query_reads_all_fields() {
        let (draft, warnings) = TripDraft::from_query(
            "?origin=NYC&destination=LON&type=roundtrip&departureDate=2025-08-18&returnDate=2025-08-21",
        )
        .unwrap();
        assert!(warnings.is_empty());
        assert_eq!(draft.origin.as_deref(), Some("NYC"));
        assert_eq!(draft.destination.as_deref(), Some("LON"));
        assert_eq!(draft.trip_type, TripType::RoundTrip);
        assert_eq!(draft.departure_date, Some(parse_date("2025-08-18").unwrap()));
        assert_eq!(draft.return_date, Some(parse_date("2025-08-21").unwrap()));
        assert_eq!(
            draft.to_query(),
            "origin=NYC&destination=LON&type=roundtrip&departureDate=2025-08-18&returnDate=2025-08-21"
        );
    }

    #[test]
    fn test_missing_type_defaults_to_roundtrip() {
        let (draft, _) = TripDraft::from_query("origin=NYC").unwrap();
        assert_eq!(draft.trip_type, TripType::RoundTrip);
    }

    #[test]
    fn test_bad_values_are_dropped_with_warnings() {
        let (draft, warnings) =
            TripDraft::from_query("type=multicity&departureDate=2025-02-30&returnDate=tomorrow").unwrap();
        assert_eq!(draft.trip_type, TripType::RoundTrip);
        assert_eq!(draft.departure_date, None);
        assert_eq!(draft.return_date, None);
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[0], Warning::UnknownTripType("multicity".into()));
    }

    #[test]
    fn test_full_url_input() {
        let (draft, _) =
            TripDraft::from_query("https://digido.example/book?origin=PAR&type=oneway").unwrap();
        assert_eq!(draft.origin.as_deref(), Some("PAR"));
        assert_eq!(draft.trip_type, TripType::OneWay);

        assert!(matches!(
            TripDraft::from_query("http://[::1"),
            Err(BookingError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_url_valued_param_in_bare_query() {
        let (draft, warnings) =
            TripDraft::from_query("origin=NYC&next=https://digido.example/done").unwrap();
        assert!(warnings.is_empty());
        assert_eq!(draft.origin.as_deref(), Some("NYC"));

        let (draft, _) =
            TripDraft::from_query("?next=https%3A%2F%2Fdigido.example&type=oneway").unwrap();
        assert_eq!(draft.trip_type, TripType::OneWay);
    }

    #[test]
    fn test_codes_from_query_are_normalized() {
        let (draft, _) = TripDraft::from_query("origin=nyc&destination=%20lon%20").unwrap();
        assert_eq!(draft.origin.as_deref(), Some("NYC"));
        assert_eq!(draft.destination.as_deref(), Some("LON"));
    }

    #[test]
    fn test_apply_to_url_keeps_unrelated_params() {
        let mut url = Url::parse("https://digido.example/book?lang=en&returnDate=2025-08-21&origin=LON").unwrap();
        let draft = TripDraft {
            origin: Some("NYC".into()),
            trip_type: TripType::OneWay,
            ..TripDraft::default()
        };
        draft.apply_to_url(&mut url);
        assert_eq!(url.query(), Some("lang=en&origin=NYC&type=oneway"));
    }
}

//! Booking form state and reconciliation
//!
//! All edits go through [`reconcile`], a pure function that applies one
//! [`FormChange`] to a [`TripDraft`] and restores the form invariants:
//!
//! - origin and destination are never the same code
//! - a one-way trip holds no return date
//! - the departure date is flyable from the origin, the return date from the
//!   destination
//! - the return date is not before the departure date
//!
//! Whenever a held value has to be dropped to keep these true, a [`Warning`]
//! says so.

use crate::client::{BookingClient, BookingResult};
use crate::dates::parse_date;
use crate::destination::{normalize_code, DestinationDirectory};
use crate::validation::{validate, TripRequest, ValidationError};
use crate::{BookingError, TripType};
use chrono::NaiveDate;
use std::fmt;
use tracing::{debug, info, instrument};

/// Transient form state, mirrored into the URL query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripDraft {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub trip_type: TripType,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
}

/// A single user interaction with the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormChange {
    SetOrigin(String),
    SetDestination(String),
    SetTripType(TripType),
    SelectDepartureDate(NaiveDate),
    SelectReturnDate(NaiveDate),
    ClearDepartureDate,
    ClearReturnDate,
}

/// User-facing notice produced while reconciling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    SameOriginAndDestination,
    DepartureUnavailableForNewOrigin,
    ReturnUnavailableForNewDestination,
    DepartureUnavailable,
    ReturnUnavailable,
    ReturnBeforeDeparture,
    ReturnDateOnOneWay,
    MalformedDate { field: &'static str, value: String },
    UnknownTripType(String),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SameOriginAndDestination => {
                f.write_str("Origin and destination cannot be the same.")
            }
            Warning::DepartureUnavailableForNewOrigin => f.write_str(
                "Previously selected departure date is unavailable for the new origin.",
            ),
            Warning::ReturnUnavailableForNewDestination => f.write_str(
                "Previously selected return date is unavailable for the new destination.",
            ),
            Warning::DepartureUnavailable => {
                f.write_str("This departure date is unavailable for the selected origin.")
            }
            Warning::ReturnUnavailable => {
                f.write_str("This return date is unavailable for the selected destination.")
            }
            Warning::ReturnBeforeDeparture => {
                f.write_str("Return date cannot be before the departure date.")
            }
            Warning::ReturnDateOnOneWay => {
                f.write_str("One-way trips do not have a return date.")
            }
            Warning::MalformedDate { field, value } => {
                write!(f, "Ignoring {field} {value:?}: expected YYYY-MM-DD.")
            }
            Warning::UnknownTripType(value) => {
                write!(f, "Unknown trip type {value:?}, using roundtrip.")
            }
        }
    }
}

/// Outcome of a reconciliation step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub draft: TripDraft,
    pub warnings: Vec<Warning>,
}

/// Apply one change to a draft and return the corrected draft plus warnings.
pub fn reconcile(directory: &DestinationDirectory, draft: &TripDraft, change: FormChange) -> Reconciled {
    let mut next = draft.clone();
    let mut warnings = Vec::new();

    match change {
        FormChange::SetOrigin(code) => {
            if next.destination.as_deref() == Some(code.as_str()) {
                warnings.push(Warning::SameOriginAndDestination);
                next.destination = None;
            }
            if let Some(departure) = next.departure_date {
                if !directory.is_day_available(departure, Some(&code)) {
                    warnings.push(Warning::DepartureUnavailableForNewOrigin);
                    next.departure_date = None;
                }
            }
            next.origin = Some(code);
        }
        FormChange::SetDestination(code) => {
            if next.origin.as_deref() == Some(code.as_str()) {
                warnings.push(Warning::SameOriginAndDestination);
                next.origin = None;
            }
            if let Some(return_date) = next.return_date {
                if !directory.is_day_available(return_date, Some(&code)) {
                    warnings.push(Warning::ReturnUnavailableForNewDestination);
                    next.return_date = None;
                }
            }
            next.destination = Some(code);
        }
        FormChange::SetTripType(trip_type) => {
            next.trip_type = trip_type;
            if trip_type == TripType::OneWay {
                next.return_date = None;
            }
        }
        FormChange::SelectDepartureDate(date) => {
            if !directory.is_day_available(date, next.origin.as_deref()) {
                warnings.push(Warning::DepartureUnavailable);
                next.departure_date = None;
            } else if next.return_date.is_some_and(|r| date > r) {
                warnings.push(Warning::ReturnBeforeDeparture);
            } else {
                next.departure_date = Some(date);
            }
        }
        FormChange::SelectReturnDate(date) => {
            if next.trip_type == TripType::OneWay {
                warnings.push(Warning::ReturnDateOnOneWay);
            } else if !directory.is_day_available(date, next.destination.as_deref()) {
                warnings.push(Warning::ReturnUnavailable);
                next.return_date = None;
            } else if next.departure_date.is_some_and(|d| date < d) {
                warnings.push(Warning::ReturnBeforeDeparture);
            } else {
                next.return_date = Some(date);
            }
        }
        FormChange::ClearDepartureDate => next.departure_date = None,
        FormChange::ClearReturnDate => next.return_date = None,
    }

    Reconciled { draft: next, warnings }
}

/// Re-check a whole draft at once, e.g. one read from a hand-edited URL.
pub fn reconcile_all(directory: &DestinationDirectory, draft: &TripDraft) -> Reconciled {
    let mut next = draft.clone();
    let mut warnings = Vec::new();

    if next.origin.is_some() && next.origin == next.destination {
        warnings.push(Warning::SameOriginAndDestination);
        next.destination = None;
    }

    if next.trip_type == TripType::OneWay && next.return_date.take().is_some() {
        warnings.push(Warning::ReturnDateOnOneWay);
    }

    if let Some(departure) = next.departure_date {
        if !directory.is_day_available(departure, next.origin.as_deref()) {
            warnings.push(Warning::DepartureUnavailable);
            next.departure_date = None;
        }
    }

    if let Some(return_date) = next.return_date {
        if !directory.is_day_available(return_date, next.destination.as_deref()) {
            warnings.push(Warning::ReturnUnavailable);
            next.return_date = None;
        } else if next.departure_date.is_some_and(|d| return_date < d) {
            warnings.push(Warning::ReturnBeforeDeparture);
            next.return_date = None;
        }
    }

    Reconciled { draft: next, warnings }
}

/// Raw field values as they arrive from a CLI, a tool call or a form post
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    /// Existing query string or URL to start from
    pub query: Option<String>,
    pub trip_type: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
}

impl FormInput {
    /// Changes in the order a user fills the form in
    pub fn changes(&self) -> Result<Vec<FormChange>, BookingError> {
        let mut changes = Vec::new();
        if let Some(trip_type) = &self.trip_type {
            changes.push(FormChange::SetTripType(trip_type.parse::<TripType>()?));
        }
        if let Some(origin) = &self.origin {
            changes.push(FormChange::SetOrigin(normalize_code(origin)));
        }
        if let Some(destination) = &self.destination {
            changes.push(FormChange::SetDestination(normalize_code(destination)));
        }
        if let Some(departure) = &self.departure_date {
            changes.push(FormChange::SelectDepartureDate(parse_date(departure)?));
        }
        if let Some(return_date) = &self.return_date {
            changes.push(FormChange::SelectReturnDate(parse_date(return_date)?));
        }
        Ok(changes)
    }
}

/// Form state holder bound to a destination directory
#[derive(Debug, Clone)]
pub struct BookingForm {
    directory: DestinationDirectory,
    draft: TripDraft,
}

impl BookingForm {
    pub fn new(directory: DestinationDirectory) -> Self {
        Self {
            directory,
            draft: TripDraft::default(),
        }
    }

    /// Restore a form from a URL query string (or a full URL).
    pub fn from_query(directory: DestinationDirectory, query: &str) -> Result<(Self, Vec<Warning>), BookingError> {
        let (draft, mut warnings) = TripDraft::from_query(query)?;
        let reconciled = reconcile_all(&directory, &draft);
        warnings.extend(reconciled.warnings);

        debug!(warnings = warnings.len(), "Restored form from query");
        Ok((
            Self {
                directory,
                draft: reconciled.draft,
            },
            warnings,
        ))
    }

    /// Build a form from raw input: the query first, then each field.
    pub fn from_input(directory: DestinationDirectory, input: &FormInput) -> Result<(Self, Vec<Warning>), BookingError> {
        let changes = input.changes()?;
        let (mut form, mut warnings) = match &input.query {
            Some(query) => Self::from_query(directory, query)?,
            None => (Self::new(directory), Vec::new()),
        };

        for change in changes {
            warnings.extend(form.apply(change));
        }

        Ok((form, warnings))
    }

    pub fn directory(&self) -> &DestinationDirectory {
        &self.directory
    }

    pub fn draft(&self) -> &TripDraft {
        &self.draft
    }

    /// Apply a change and return whatever warnings it raised.
    pub fn apply(&mut self, change: FormChange) -> Vec<Warning> {
        debug!(?change, "Applying form change");
        let Reconciled { draft, warnings } = reconcile(&self.directory, &self.draft, change);
        self.draft = draft;
        warnings
    }

    /// Shareable query string for the current state
    pub fn to_query(&self) -> String {
        self.draft.to_query()
    }

    pub fn validate(&self) -> Result<TripRequest, ValidationError> {
        validate(&self.directory, &self.draft)
    }

    /// Validate and submit.
    ///
    /// `&mut self` keeps a form to one in-flight submission. A successful
    /// booking clears the draft; a failed one keeps it for resubmission.
    #[instrument(level = "info", skip(self, client))]
    pub async fn submit(&mut self, client: &BookingClient) -> Result<BookingResult, ValidationError> {
        let request = self.validate()?;
        let result = client.book(&request).await;

        if result.is_success() {
            info!("Booking confirmed, clearing form");
            self.draft = TripDraft::default();
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn directory() -> DestinationDirectory {
        DestinationDirectory::builtin()
    }

    fn draft(origin: Option<&str>, destination: Option<&str>) -> TripDraft {
        TripDraft {
            origin: origin.map(String::from),
            destination: destination.map(String::from),
            ..TripDraft::default()
        }
    }

    #[test]
    fn test_origin_equal_to_destination_clears_destination() {
        let start = draft(Some("NYC"), Some("LON"));
        let result = reconcile(&directory(), &start, FormChange::SetOrigin("LON".into()));
        assert_eq!(result.draft.origin.as_deref(), Some("LON"));
        assert_eq!(result.draft.destination, None);
        assert_eq!(result.warnings, vec![Warning::SameOriginAndDestination]);
    }

    #[test]
    fn test_destination_equal_to_origin_clears_origin() {
        let start = draft(Some("NYC"), Some("LON"));
        let result = reconcile(&directory(), &start, FormChange::SetDestination("NYC".into()));
        assert_eq!(result.draft.origin, None);
        assert_eq!(result.draft.destination.as_deref(), Some("NYC"));
        assert_eq!(result.warnings, vec![Warning::SameOriginAndDestination]);
    }

    #[test]
    fn test_origin_and_destination_never_equal_after_any_city_change() {
        let directory = directory();
        let codes: Vec<String> = directory.destinations().iter().map(|d| d.code.clone()).collect();
        for origin in &codes {
            for destination in &codes {
                for code in &codes {
                    let start = draft(Some(origin), Some(destination));
                    for change in [FormChange::SetOrigin(code.clone()), FormChange::SetDestination(code.clone())] {
                        let result = reconcile(&directory, &start, change);
                        assert!(
                            result.draft.origin.is_none() || result.draft.origin != result.draft.destination,
                            "{:?}",
                            result.draft
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_switching_to_one_way_clears_return_date() {
        let mut start = draft(Some("NYC"), Some("LON"));
        start.departure_date = Some(date("2025-08-18"));
        start.return_date = Some(date("2025-08-19"));

        let result = reconcile(&directory(), &start, FormChange::SetTripType(TripType::OneWay));
        assert_eq!(result.draft.trip_type, TripType::OneWay);
        assert_eq!(result.draft.return_date, None);
        assert_eq!(result.draft.departure_date, Some(date("2025-08-18")));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_origin_change_invalidates_departure_date() {
        let mut start = draft(Some("NYC"), None);
        // Monday: fine for NYC, not for LON (Tue/Thu/Sat)
        start.departure_date = Some(date("2025-08-18"));

        let result = reconcile(&directory(), &start, FormChange::SetOrigin("LON".into()));
        assert_eq!(result.draft.departure_date, None);
        assert_eq!(result.warnings, vec![Warning::DepartureUnavailableForNewOrigin]);

        let kept = reconcile(&directory(), &start, FormChange::SetOrigin("TYO".into()));
        assert_eq!(kept.draft.departure_date, Some(date("2025-08-18")));
        assert!(kept.warnings.is_empty());
    }

    #[test]
    fn test_destination_change_invalidates_return_date() {
        let mut start = draft(Some("NYC"), Some("LON"));
        start.return_date = Some(date("2025-08-19"));

        let result = reconcile(&directory(), &start, FormChange::SetDestination("TYO".into()));
        assert_eq!(result.draft.return_date, None);
        assert_eq!(result.warnings, vec![Warning::ReturnUnavailableForNewDestination]);
    }

    #[test]
    fn test_unavailable_departure_selection_is_rejected() {
        let mut start = draft(Some("NYC"), Some("LON"));
        start.departure_date = Some(date("2025-08-18"));

        // Tuesday is not a NYC day; the held Monday is cleared as well
        let result = reconcile(&directory(), &start, FormChange::SelectDepartureDate(date("2025-08-19")));
        assert_eq!(result.draft.departure_date, None);
        assert_eq!(result.warnings, vec![Warning::DepartureUnavailable]);
    }

    #[test]
    fn test_date_selection_without_city_is_permissive() {
        let result = reconcile(&directory(), &TripDraft::default(), FormChange::SelectDepartureDate(date("2025-08-19")));
        assert_eq!(result.draft.departure_date, Some(date("2025-08-19")));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_return_selection_rules() {
        let mut start = draft(Some("NYC"), Some("LON"));
        start.departure_date = Some(date("2025-08-20"));

        let before = reconcile(&directory(), &start, FormChange::SelectReturnDate(date("2025-08-19")));
        assert_eq!(before.draft.return_date, None);
        assert_eq!(before.warnings, vec![Warning::ReturnBeforeDeparture]);

        let ok = reconcile(&directory(), &start, FormChange::SelectReturnDate(date("2025-08-21")));
        assert_eq!(ok.draft.return_date, Some(date("2025-08-21")));

        let unavailable = reconcile(&directory(), &start, FormChange::SelectReturnDate(date("2025-08-22")));
        assert_eq!(unavailable.draft.return_date, None);
        assert_eq!(unavailable.warnings, vec![Warning::ReturnUnavailable]);

        start.trip_type = TripType::OneWay;
        let one_way = reconcile(&directory(), &start, FormChange::SelectReturnDate(date("2025-08-21")));
        assert_eq!(one_way.draft.return_date, None);
        assert_eq!(one_way.warnings, vec![Warning::ReturnDateOnOneWay]);
    }

    #[test]
    fn test_departure_after_return_is_rejected() {
        let mut start = draft(Some("DXB"), Some("LON"));
        start.return_date = Some(date("2025-08-19"));

        let result = reconcile(&directory(), &start, FormChange::SelectDepartureDate(date("2025-08-20")));
        assert_eq!(result.draft.departure_date, None);
        assert_eq!(result.draft.return_date, Some(date("2025-08-19")));
        assert_eq!(result.warnings, vec![Warning::ReturnBeforeDeparture]);
    }

    #[test]
    fn test_reconcile_all_repairs_hand_edited_state() {
        let tampered = TripDraft {
            origin: Some("NYC".into()),
            destination: Some("NYC".into()),
            trip_type: TripType::OneWay,
            departure_date: Some(date("2025-08-19")),
            return_date: Some(date("2025-08-21")),
        };

        let result = reconcile_all(&directory(), &tampered);
        assert_eq!(result.draft.origin.as_deref(), Some("NYC"));
        assert_eq!(result.draft.destination, None);
        assert_eq!(result.draft.return_date, None);
        assert_eq!(result.draft.departure_date, None);
        assert_eq!(
            result.warnings,
            vec![
                Warning::SameOriginAndDestination,
                Warning::ReturnDateOnOneWay,
                Warning::DepartureUnavailable,
            ]
        );
    }

    #[test]
    fn test_reconcile_all_is_stable_on_valid_state() {
        let valid = TripDraft {
            origin: Some("NYC".into()),
            destination: Some("LON".into()),
            trip_type: TripType::RoundTrip,
            departure_date: Some(date("2025-08-18")),
            return_date: Some(date("2025-08-21")),
        };
        let result = reconcile_all(&directory(), &valid);
        assert_eq!(result.draft, valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_form_apply_tracks_state() {
        let mut form = BookingForm::new(directory());
        assert!(form.apply(FormChange::SetOrigin("NYC".into())).is_empty());
        assert!(form.apply(FormChange::SetDestination("LON".into())).is_empty());
        assert!(form.apply(FormChange::SelectDepartureDate(date("2025-08-18"))).is_empty());
        assert_eq!(form.draft().departure_date, Some(date("2025-08-18")));

        let warnings = form.apply(FormChange::SelectDepartureDate(date("2025-08-19")));
        assert_eq!(warnings, vec![Warning::DepartureUnavailable]);
        assert_eq!(form.draft().departure_date, None);
        // Re-evaluating the same state gives the same answer
        assert!(reconcile_all(form.directory(), form.draft()).warnings.is_empty());
    }

    #[test]
    fn test_from_input_applies_query_then_fields() {
        let input = FormInput {
            query: Some("origin=NYC&destination=LON&departureDate=2025-08-18".into()),
            trip_type: Some("oneway".into()),
            destination: Some(" nyc".into()),
            ..FormInput::default()
        };

        let (form, warnings) = BookingForm::from_input(directory(), &input).unwrap();
        assert_eq!(warnings, vec![Warning::SameOriginAndDestination]);
        assert_eq!(form.draft().origin, None);
        assert_eq!(form.draft().destination.as_deref(), Some("NYC"));
        assert_eq!(form.to_query(), "destination=NYC&type=oneway&departureDate=2025-08-18");
    }

    #[test]
    fn test_from_input_rejects_bad_values() {
        let bad_type = FormInput {
            trip_type: Some("multicity".into()),
            ..FormInput::default()
        };
        assert!(matches!(
            BookingForm::from_input(directory(), &bad_type),
            Err(BookingError::InvalidTripType(_))
        ));

        let bad_date = FormInput {
            departure_date: Some("18/08/2025".into()),
            ..FormInput::default()
        };
        assert!(matches!(
            BookingForm::from_input(directory(), &bad_date),
            Err(BookingError::DateParseError(_))
        ));
    }

    #[test]
    fn test_warning_messages() {
        assert_eq!(
            Warning::SameOriginAndDestination.to_string(),
            "Origin and destination cannot be the same."
        );
        assert_eq!(
            Warning::DepartureUnavailableForNewOrigin.to_string(),
            "Previously selected departure date is unavailable for the new origin."
        );
    }
}

//! Service booking requests.
//!
//! [`BookingDraft`] is what a family typed into the booking form.
//! [`BookingDraft::validate`] turns it into a [`NewServiceRequest`] or a
//! [`BookingError`] naming the first bad field, without touching storage.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{RequestStatus, ServiceRequestId, UserId};

/// Booking form rejected before submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("please select a date")]
    MissingDate,

    #[error("date must be in YYYY-MM-DD format")]
    InvalidDate,

    #[error("the selected date has already passed")]
    DateInPast,

    #[error("time must be in HH:MM format")]
    InvalidTime,

    #[error("duration must be a whole number of hours")]
    DurationNotANumber,

    #[error("duration must be at least one hour")]
    DurationNotPositive,
}

/// Raw booking form input. Every field arrives as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingDraft {
    pub service_type: String,
    pub care_type: String,
    pub address: String,
    /// `YYYY-MM-DD` from the date picker.
    pub date: String,
    /// `HH:MM`, 24-hour.
    pub time: String,
    pub duration_hours: String,
    pub notes: String,
}

impl BookingDraft {
    /// An empty form with the address taken from the client's profile.
    #[must_use]
    pub fn prefilled(address: Option<&str>) -> Self {
        Self {
            address: address.unwrap_or_default().to_owned(),
            ..Self::default()
        }
    }

    /// Validate the form.
    ///
    /// `today` is the business's local date; visits cannot start before it.
    ///
    /// # Errors
    ///
    /// Returns the first [`BookingError`] found, checking text fields, then
    /// date, time and duration.
    pub fn validate(&self, today: NaiveDate) -> Result<NewServiceRequest, BookingError> {
        let service_type = required(&self.service_type, "service type")?;
        let care_type = required(&self.care_type, "care type")?;
        let address = required(&self.address, "address")?;

        let date = self.date.trim();
        if date.is_empty() {
            return Err(BookingError::MissingDate);
        }
        let date =
            NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| BookingError::InvalidDate)?;
        if date < today {
            return Err(BookingError::DateInPast);
        }

        let time = self.time.trim();
        if time.is_empty() {
            return Err(BookingError::MissingField("time"));
        }
        let time = NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| BookingError::InvalidTime)?;

        let duration_hours = parse_duration(&self.duration_hours)?;

        let notes = self.notes.trim();
        Ok(NewServiceRequest {
            service_type,
            care_type,
            address,
            start_time: date.and_time(time),
            duration_hours,
            notes: (!notes.is_empty()).then(|| notes.to_owned()),
            status: RequestStatus::Pending,
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, BookingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(BookingError::MissingField(field))
    } else {
        Ok(trimmed.to_owned())
    }
}

fn parse_duration(raw: &str) -> Result<i32, BookingError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(BookingError::MissingField("duration"));
    }
    let hours: i32 = raw.parse().map_err(|_| BookingError::DurationNotANumber)?;
    if hours <= 0 {
        return Err(BookingError::DurationNotPositive);
    }
    Ok(hours)
}

/// A validated request ready to insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewServiceRequest {
    pub service_type: String,
    pub care_type: String,
    pub address: String,
    /// Wall-clock start in the business's local time.
    pub start_time: NaiveDateTime,
    pub duration_hours: i32,
    pub notes: Option<String>,
    pub status: RequestStatus,
}

/// A stored service request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct ServiceRequest {
    pub id: ServiceRequestId,
    pub user_id: UserId,
    pub service_type: String,
    pub care_type: String,
    pub address: String,
    pub start_time: NaiveDateTime,
    pub duration_hours: i32,
    pub status: RequestStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ServiceRequest {
    /// `Tue, Mar 3 at 09:00`
    #[must_use]
    pub fn start_label(&self) -> String {
        self.start_time.format("%a, %b %-d at %H:%M").to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn draft() -> BookingDraft {
        BookingDraft {
            service_type: "Full-Day Childcare".to_owned(),
            care_type: "baby".to_owned(),
            address: "X".to_owned(),
            date: "2026-03-03".to_owned(),
            time: "09:00".to_owned(),
            duration_hours: "4".to_owned(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_valid_draft_combines_date_and_time() {
        let request = draft().validate(today()).unwrap();

        let expected = NaiveDate::from_ymd_opt(2026, 3, 3)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(request.start_time, expected);
        assert_eq!(request.duration_hours, 4);
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.service_type, "Full-Day Childcare");
        assert_eq!(request.care_type, "baby");
        assert_eq!(request.notes, None);
    }

    #[test]
    fn test_missing_date_is_rejected() {
        let mut form = draft();
        form.date = "  ".to_owned();
        assert_eq!(form.validate(today()), Err(BookingError::MissingDate));
    }

    #[test]
    fn test_bad_durations_are_rejected() {
        let cases = [
            ("", BookingError::MissingField("duration")),
            ("0", BookingError::DurationNotPositive),
            ("-3", BookingError::DurationNotPositive),
            ("four", BookingError::DurationNotANumber),
            ("2.5", BookingError::DurationNotANumber),
            ("99999999999", BookingError::DurationNotANumber),
        ];
        for (raw, expected) in cases {
            let mut form = draft();
            form.duration_hours = raw.to_owned();
            assert_eq!(form.validate(today()), Err(expected), "duration {raw:?}");
        }
    }

    #[test]
    fn test_multi_day_visits_are_accepted() {
        let mut form = draft();
        form.duration_hours = "48".to_owned();
        assert_eq!(form.validate(today()).unwrap().duration_hours, 48);
    }

    #[test]
    fn test_required_text_fields() {
        let mut form = draft();
        form.address = String::new();
        assert_eq!(
            form.validate(today()),
            Err(BookingError::MissingField("address"))
        );

        let mut form = draft();
        form.service_type = "\t".to_owned();
        assert_eq!(
            form.validate(today()),
            Err(BookingError::MissingField("service type"))
        );
    }

    #[test]
    fn test_time_format() {
        let mut form = draft();
        form.time = "9am".to_owned();
        assert_eq!(form.validate(today()), Err(BookingError::InvalidTime));

        form.time = String::new();
        assert_eq!(
            form.validate(today()),
            Err(BookingError::MissingField("time"))
        );
    }

    #[test]
    fn test_past_dates_are_rejected_but_today_is_fine() {
        let mut form = draft();
        form.date = "2026-03-01".to_owned();
        assert_eq!(form.validate(today()), Err(BookingError::DateInPast));

        form.date = "2026-03-02".to_owned();
        assert!(form.validate(today()).is_ok());
    }

    #[test]
    fn test_values_are_trimmed_and_notes_kept() {
        let mut form = draft();
        form.address = "  12 Elm Street ".to_owned();
        form.notes = " Allergic to peanuts ".to_owned();
        let request = form.validate(today()).unwrap();
        assert_eq!(request.address, "12 Elm Street");
        assert_eq!(request.notes.as_deref(), Some("Allergic to peanuts"));
    }

    #[test]
    fn test_prefilled_uses_profile_address() {
        let form = BookingDraft::prefilled(Some("4 Birch Lane"));
        assert_eq!(form.address, "4 Birch Lane");
        assert!(form.date.is_empty());
        assert_eq!(BookingDraft::prefilled(None), BookingDraft::default());
    }

    #[test]
    fn test_start_label() {
        let request = ServiceRequest {
            id: ServiceRequestId::new(1),
            user_id: UserId::new(1),
            service_type: "Companion Visit".to_owned(),
            care_type: "elderly".to_owned(),
            address: "X".to_owned(),
            start_time: NaiveDate::from_ymd_opt(2026, 3, 3)
                .unwrap()
                .and_hms_opt(22, 0, 0)
                .unwrap(),
            duration_hours: 4,
            status: RequestStatus::Pending,
            notes: None,
            created_at: Utc::now(),
        };
        assert_eq!(request.start_label(), "Tue, Mar 3 at 22:00");
    }
}

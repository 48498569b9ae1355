//! Input checks shared by the scheduling service and the catalog handlers.
//!
//! Request bodies use `Option` fields so a missing value is reported as a validation error naming
//! every absent field at once, instead of a deserialization failure on the first one.

use chrono::{NaiveDate, NaiveTime};

use crate::errors::{Error, Result};
use crate::types::DayOfWeek;

/// Wire format for times of day
pub const TIME_FORMAT: &str = "%H:%M";
/// Wire format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Collects missing required fields across a request.
#[derive(Debug, Default)]
pub struct RequiredFields {
    missing: Vec<String>,
}

impl RequiredFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `name` as missing when `value` is `None` (or a blank string).
    pub fn take<T: IsBlank>(&mut self, name: &str, value: Option<T>) -> Option<T> {
        match value {
            Some(v) if !v.is_blank() => Some(v),
            _ => {
                self.missing.push(name.to_string());
                None
            }
        }
    }

    /// Fails with every missing field recorded so far
    pub fn finish(self) -> Result<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation {
                message: format!("Missing required field(s): {}", self.missing.join(", ")),
                fields: self.missing,
            })
        }
    }
}

/// Treats whitespace-only strings as absent
pub trait IsBlank {
    fn is_blank(&self) -> bool {
        false
    }
}

impl IsBlank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl IsBlank for i64 {}
impl IsBlank for i32 {}
impl IsBlank for bool {}

/// Unwraps a value that [`RequiredFields::finish`] has already vouched for.
pub fn present<T>(value: Option<T>, name: &str) -> Result<T> {
    value.ok_or_else(|| Error::Validation {
        message: format!("Missing required field(s): {name}"),
        fields: vec![name.to_string()],
    })
}

pub fn parse_time(field: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT).map_err(|_| Error::Format {
        message: format!("Invalid {field} '{value}'. Use HH:MM format."),
    })
}

pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| Error::Format {
        message: format!("Invalid {field} '{value}'. Use YYYY-MM-DD format."),
    })
}

pub fn parse_day(value: &str) -> Result<DayOfWeek> {
    value.parse::<DayOfWeek>().map_err(|e| Error::Validation {
        message: e.to_string(),
        fields: vec!["day_of_week".to_string()],
    })
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Rejects an explicitly supplied blank string; `None` passes.
pub fn not_blank(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) if v.trim().is_empty() => Err(Error::Validation {
            message: format!("{field} must not be blank"),
            fields: vec![field.to_string()],
        }),
        _ => Ok(()),
    }
}

pub fn at_least(field: &str, value: i32, min: i32) -> Result<()> {
    if value < min {
        return Err(Error::Validation {
            message: format!("{field} must be at least {min}"),
            fields: vec![field.to_string()],
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_fields_reports_every_missing_field() {
        let mut required = RequiredFields::new();
        let a = required.take("semester_id", Some(1_i64));
        let b = required.take::<String>("start_time", None);
        let c = required.take("end_time", Some("   ".to_string()));
        assert_eq!(a, Some(1));
        assert!(b.is_none() && c.is_none());

        match required.finish() {
            Err(Error::Validation { fields, .. }) => assert_eq!(fields, vec!["start_time", "end_time"]),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_time_parsing() {
        assert_eq!(parse_time("start_time", "09:30").unwrap(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(format_time(parse_time("start_time", "23:05").unwrap()), "23:05");
        assert!(matches!(parse_time("start_time", "9.30"), Err(Error::Format { .. })));
        assert!(matches!(parse_time("start_time", "25:00"), Err(Error::Format { .. })));
        assert!(matches!(parse_time("start_time", "noon"), Err(Error::Format { .. })));
    }

    #[test]
    fn test_date_parsing() {
        assert!(parse_date("start_date", "2025-08-11").is_ok());
        assert!(matches!(parse_date("start_date", "11/08/2025"), Err(Error::Format { .. })));
    }

    #[test]
    fn test_blank_and_minimum_checks() {
        assert!(not_blank("name", None).is_ok());
        assert!(not_blank("name", Some("L201")).is_ok());
        assert!(matches!(not_blank("name", Some("  ")), Err(Error::Validation { fields, .. }) if fields == ["name"]));

        assert!(at_least("units", 3, 1).is_ok());
        assert!(matches!(at_least("capacity", 0, 1), Err(Error::Validation { .. })));
    }

    #[test]
    fn test_unknown_day_is_a_validation_error() {
        assert_eq!(parse_day("tuesday").unwrap(), DayOfWeek::Tuesday);
        assert!(matches!(parse_day("Someday"), Err(Error::Validation { .. })));
    }
}

//! Error types for timetable import and layout operations.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while importing, storing or laying out periods.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum TimetableError {
    /// Time string was not `HH:MM` or `HH:MM:SS`
    #[error("Invalid time format: {input:?}")]
    InvalidTimeFormat { input: String },

    /// Start time is not strictly before end time
    #[error("Invalid period range: {start} is not before {end}")]
    InvalidPeriodRange { start: String, end: String },

    /// Subject text was blank after trimming
    #[error("Subject name is empty")]
    EmptySubjectName,

    /// Day of week outside 0..=6
    #[error("Invalid day of week: {day}")]
    InvalidDay { day: i64 },

    /// The recognizer found no periods in the image
    #[error("No periods were recognized in the image")]
    RecognizerEmpty,

    /// The recognizer could not be reached or returned garbage
    #[error("Recognizer error: {message}")]
    Recognizer { message: String },

    /// A create/update/read against the store failed
    #[error("Persistence failure: {message}")]
    Persistence { message: String },

    /// Referenced record does not exist for this user
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// The printable page template failed to render
    #[error("Render failure: {message}")]
    Render { message: String },
}

impl TimetableError {
    /// Returns true if the error was caused by bad caller input.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            TimetableError::InvalidTimeFormat { .. }
                | TimetableError::InvalidPeriodRange { .. }
                | TimetableError::InvalidDay { .. }
                | TimetableError::EmptySubjectName
        )
    }
}

impl From<rusqlite::Error> for TimetableError {
    fn from(err: rusqlite::Error) -> Self {
        TimetableError::Persistence {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for TimetableError {
    fn from(err: reqwest::Error) -> Self {
        TimetableError::Recognizer {
            message: err.to_string(),
        }
    }
}

impl From<askama::Error> for TimetableError {
    fn from(err: askama::Error) -> Self {
        TimetableError::Render {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for TimetableError {
    fn from(err: url::ParseError) -> Self {
        TimetableError::Recognizer {
            message: format!("Bad recognizer URL: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_kinds() {
        assert!(TimetableError::InvalidTimeFormat {
            input: "9".to_string()
        }
        .is_input_error());
        assert!(TimetableError::InvalidDay { day: 7 }.is_input_error());
        assert!(!TimetableError::RecognizerEmpty.is_input_error());
        assert!(!TimetableError::Persistence {
            message: "disk full".to_string()
        }
        .is_input_error());
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let value = serde_json::to_value(TimetableError::InvalidDay { day: 9 }).unwrap();
        assert_eq!(value["kind"], "InvalidDay");
        assert_eq!(value["day"], 9);
    }

    #[test]
    fn test_display() {
        let err = TimetableError::InvalidPeriodRange {
            start: "10:00:00".to_string(),
            end: "09:00:00".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid period range: 10:00:00 is not before 09:00:00"
        );
    }
}

//! Wall-clock time normalization.
//!
//! Every stored time is a zero-padded `HH:MM:SS` string so that plain string
//! comparison orders times correctly.

use crate::error::TimetableError;
use regex::Regex;
use std::sync::LazyLock;

static TIME_FIELD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{2}$").unwrap());

/// Canonicalizes a time string to `HH:MM:SS`.
///
/// `HH:MM` gets `:00` appended, `HH:MM:SS` is returned as-is. Any other
/// number of fields, or a field that is not two ASCII digits, is rejected.
pub fn normalize_time(input: &str) -> Result<String, TimetableError> {
    let trimmed = input.trim();
    let fields: Vec<&str> = trimmed.split(':').collect();

    let invalid = || TimetableError::InvalidTimeFormat {
        input: input.to_string(),
    };

    if !fields.iter().all(|f| TIME_FIELD_REGEX.is_match(f)) {
        return Err(invalid());
    }

    match fields.len() {
        2 => Ok(format!("{}:00", trimmed)),
        3 => Ok(trimmed.to_string()),
        _ => Err(invalid()),
    }
}

/// Truncates a normalized `HH:MM:SS` time to its `HH:MM` slot label.
pub fn truncate_to_slot(time: &str) -> &str {
    time.get(..5).unwrap_or(time)
}

/// Normalizes both ends of a period and checks `start < end`.
pub fn normalize_range(start: &str, end: &str) -> Result<(String, String), TimetableError> {
    let start = normalize_time(start)?;
    let end = normalize_time(end)?;

    if start >= end {
        return Err(TimetableError::InvalidPeriodRange { start, end });
    }

    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_fields_get_seconds() {
        assert_eq!(normalize_time("09:30").unwrap(), "09:30:00");
    }

    #[test]
    fn test_three_fields_unchanged() {
        assert_eq!(normalize_time("09:30:00").unwrap(), "09:30:00");
        assert_eq!(normalize_time(" 14:05:59 ").unwrap(), "14:05:59");
    }

    #[test]
    fn test_bad_shapes_rejected() {
        for input in [
            "9",
            "",
            "09:30:00:00",
            "9:30",
            "09:3a",
            "noon",
            "٠٩:٣٠",
            "０９:３０",
        ] {
            assert_eq!(
                normalize_time(input),
                Err(TimetableError::InvalidTimeFormat {
                    input: input.to_string()
                }),
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_truncate_to_slot() {
        assert_eq!(truncate_to_slot("09:30:00"), "09:30");
        assert_eq!(truncate_to_slot("09:3"), "09:3");
    }

    #[test]
    fn test_range_requires_start_before_end() {
        assert_eq!(
            normalize_range("09:00", "10:15").unwrap(),
            ("09:00:00".to_string(), "10:15:00".to_string())
        );
        assert!(matches!(
            normalize_range("10:00", "10:00:00"),
            Err(TimetableError::InvalidPeriodRange { .. })
        ));
        assert!(matches!(
            normalize_range("11:00", "10:00"),
            Err(TimetableError::InvalidPeriodRange { .. })
        ));
    }
}

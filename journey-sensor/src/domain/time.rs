//! Timestamp handling for the transport API.
//!
//! The API reports ISO-8601 timestamps, normally with a UTC offset
//! (`2024-01-01T10:00:00+01:00`). Some deployments omit the offset; those
//! are read as UTC so that durations between them remain well defined.

use chrono::{DateTime, FixedOffset, NaiveDateTime};

/// Error returned when parsing an invalid timestamp string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timestamp {input:?}: {reason}")]
pub struct TimeError {
    input: String,
    reason: &'static str,
}

impl TimeError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Naive formats accepted when no offset is present.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an ISO-8601 timestamp.
///
/// # Examples
///
/// ```
/// use journey_sensor::domain::parse_timestamp;
///
/// let t = parse_timestamp("2024-01-01T10:00:00+01:00").unwrap();
/// assert_eq!(t.offset().local_minus_utc(), 3600);
///
/// // Without an offset the timestamp is taken as UTC
/// let t = parse_timestamp("2024-01-01T10:00:00").unwrap();
/// assert_eq!(t.offset().local_minus_utc(), 0);
///
/// assert!(parse_timestamp("10:00").is_err());
/// ```
pub fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>, TimeError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(TimeError::new(s, "empty string"));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt);
    }

    // RFC 3339 requires seconds; ISO-8601 permits "+01:00" after "HH:MM"
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M%:z") {
        return Ok(dt);
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }

    Err(TimeError::new(s, "expected ISO-8601 date and time"))
}

//! Errors raised while validating availability and generating slots.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use thiserror::Error;

/// Errors that can occur while expanding availability or generating slots.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    // ========== Query Validation ==========
    /// The requested lesson duration is not offered by the teacher.
    #[error("Duration of {duration} minutes is not allowed (allowed: {allowed:?})")]
    DurationNotAllowed {
        /// Requested duration in minutes.
        duration: u32,
        /// Durations the teacher offers.
        allowed: Vec<u32>,
    },

    /// The date range ends before it starts.
    #[error("Date range is inverted: {from} is after {to}")]
    InvertedRange {
        /// First requested date.
        from: NaiveDate,
        /// Last requested date.
        to: NaiveDate,
    },

    /// The date range covers more days than allowed.
    #[error("Date range spans {days} days, maximum is {max}")]
    RangeTooLarge {
        /// Number of days requested (inclusive).
        days: i64,
        /// Configured maximum.
        max: u32,
    },

    // ========== Rule Validation ==========
    /// A time window must start before it ends.
    #[error("Time window must start before it ends ({start} - {end})")]
    InvalidWindow {
        /// Window start.
        start: NaiveTime,
        /// Window end.
        end: NaiveTime,
    },

    /// A rule's validity period ends before it starts.
    #[error("Validity period is inverted: {from} is after {until}")]
    InvalidValidity {
        /// First valid date.
        from: NaiveDate,
        /// Last valid date.
        until: NaiveDate,
    },

    // ========== Commit-time Checks ==========
    /// The requested interval is not inside the teacher's availability.
    #[error("Requested time is outside the teacher's availability")]
    OutsideAvailability,

    /// The requested interval starts too soon.
    #[error("Lessons must start after {earliest}")]
    TooSoon {
        /// Earliest instant a lesson may start after.
        earliest: DateTime<Utc>,
    },

    /// The requested interval is empty or inverted.
    #[error("Lesson must end after it starts")]
    EmptyInterval,
}

impl SchedulingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DurationNotAllowed { .. } => "DURATION_NOT_ALLOWED",
            Self::InvertedRange { .. } => "INVERTED_RANGE",
            Self::RangeTooLarge { .. } => "RANGE_TOO_LARGE",
            Self::InvalidWindow { .. } => "INVALID_WINDOW",
            Self::InvalidValidity { .. } => "INVALID_VALIDITY",
            Self::OutsideAvailability => "OUTSIDE_AVAILABILITY",
            Self::TooSoon { .. } => "TOO_SOON",
            Self::EmptyInterval => "EMPTY_INTERVAL",
        }
    }

    /// Returns the HTTP status code for this error.
    ///
    /// Every scheduling error is a caller mistake.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        400
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            SchedulingError::DurationNotAllowed {
                duration: 45,
                allowed: vec![30, 60],
            }
            .error_code(),
            "DURATION_NOT_ALLOWED"
        );
        assert_eq!(SchedulingError::OutsideAvailability.error_code(), "OUTSIDE_AVAILABILITY");
        assert_eq!(SchedulingError::EmptyInterval.http_status_code(), 400);
    }

    #[test]
    fn test_display_mentions_limits() {
        let err = SchedulingError::RangeTooLarge { days: 120, max: 90 };
        assert_eq!(err.to_string(), "Date range spans 120 days, maximum is 90");
    }
}

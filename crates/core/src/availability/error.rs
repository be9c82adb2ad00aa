//! Availability management errors.

use chrono::NaiveDate;
use thiserror::Error;
use tutora_shared::types::{AvailabilityRuleId, TeacherId};

use crate::repository::StoreError;
use crate::scheduling::SchedulingError;

/// Errors that can occur while managing availability rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AvailabilityError {
    /// The rule breaks a scheduling invariant.
    #[error(transparent)]
    Invalid(#[from] SchedulingError),

    /// Teacher not found.
    #[error("Teacher not found: {0}")]
    TeacherNotFound(TeacherId),

    /// Rule not found for this teacher.
    #[error("Availability rule not found: {0}")]
    RuleNotFound(AvailabilityRuleId),

    /// The teacher already has an exception on this local date.
    #[error("An availability exception already exists on {0}")]
    DuplicateException(NaiveDate),

    /// Another operation holds the teacher's calendar.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl AvailabilityError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Invalid(err) => err.error_code(),
            Self::TeacherNotFound(_) => "TEACHER_NOT_FOUND",
            Self::RuleNotFound(_) => "RULE_NOT_FOUND",
            Self::DuplicateException(_) => "EXCEPTION_EXISTS",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Invalid(err) => err.http_status_code(),
            Self::TeacherNotFound(_) | Self::RuleNotFound(_) => 404,
            Self::DuplicateException(_) | Self::ConcurrentModification => 409,
            Self::Database(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}

impl From<StoreError> for AvailabilityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Busy(_) => Self::ConcurrentModification,
            StoreError::Database(message) => Self::Database(message),
        }
    }
}

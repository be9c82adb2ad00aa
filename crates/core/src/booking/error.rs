//! Booking error types.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tutora_shared::types::{BookingId, SubjectOfferingId, TeacherId};

use super::types::BookingStatus;
use crate::repository::StoreError;
use crate::scheduling::SchedulingError;

/// Errors that can occur while creating or transitioning bookings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    // ========== Validation Errors ==========
    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested time fails a scheduling check.
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    /// Cancellation requires a reason.
    #[error("Cancellation reason is required")]
    ReasonRequired,

    /// The offering cannot be booked with this teacher.
    #[error("Subject offering {0} is not bookable")]
    OfferingUnavailable(SubjectOfferingId),

    // ========== Conflict Errors ==========
    /// Another active booking overlaps the requested time.
    #[error("Slot {start_at} - {end_at} is already taken for teacher {teacher_id}")]
    SlotTaken {
        /// Teacher whose calendar is occupied.
        teacher_id: TeacherId,
        /// Requested start.
        start_at: DateTime<Utc>,
        /// Requested end.
        end_at: DateTime<Utc>,
    },

    /// The transition is not allowed from the current status.
    #[error("Invalid booking transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: BookingStatus,
        /// Requested status.
        to: BookingStatus,
    },

    /// The lesson has not ended yet.
    #[error("Lesson ends at {end_at} and cannot be completed yet")]
    NotYetEnded {
        /// Lesson end.
        end_at: DateTime<Utc>,
    },

    // ========== Lookup Errors ==========
    /// Booking not found.
    #[error("Booking not found: {0}")]
    NotFound(BookingId),

    /// Teacher not found.
    #[error("Teacher not found: {0}")]
    TeacherNotFound(TeacherId),

    /// Subject offering not found.
    #[error("Subject offering not found: {0}")]
    OfferingNotFound(SubjectOfferingId),

    // ========== Concurrency Errors ==========
    /// Another operation holds the teacher's calendar.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl BookingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Scheduling(err) => err.error_code(),
            Self::ReasonRequired => "CANCELLATION_REASON_REQUIRED",
            Self::OfferingUnavailable(_) => "OFFERING_UNAVAILABLE",
            Self::SlotTaken { .. } => "SLOT_TAKEN",
            Self::InvalidTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::NotYetEnded { .. } => "LESSON_NOT_ENDED",
            Self::NotFound(_) => "BOOKING_NOT_FOUND",
            Self::TeacherNotFound(_) => "TEACHER_NOT_FOUND",
            Self::OfferingNotFound(_) => "OFFERING_NOT_FOUND",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::Validation(_) | Self::ReasonRequired | Self::OfferingUnavailable(_) => 400,
            Self::Scheduling(err) => err.http_status_code(),

            // 404 Not Found
            Self::NotFound(_) | Self::TeacherNotFound(_) | Self::OfferingNotFound(_) => 404,

            // 409 Conflict
            Self::SlotTaken { .. }
            | Self::InvalidTransition { .. }
            | Self::NotYetEnded { .. }
            | Self::ConcurrentModification => 409,

            // 500 Internal Server Error
            Self::Database(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// `SlotTaken` is final: the caller must pick another slot.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Busy(_) => Self::ConcurrentModification,
            StoreError::Database(message) => Self::Database(message),
        }
    }
}

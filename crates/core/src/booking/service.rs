//! Booking state machine.
//!
//! Transitions are computed here and applied by the caller, which persists
//! them with a compare-and-set on the previous status.

use chrono::{DateTime, Utc};

use super::error::BookingError;
use super::types::{Booking, BookingStatus, Party};

/// Reason recorded when a pending booking is never confirmed.
pub const EXPIRED_REASON: &str = "expired: not confirmed before the lesson started";

/// A validated status change with its audit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingTransition {
    /// Pending → Confirmed.
    Confirm {
        /// New status.
        new_status: BookingStatus,
        /// When the booking was confirmed.
        confirmed_at: DateTime<Utc>,
    },
    /// Pending | Confirmed → Cancelled.
    Cancel {
        /// New status.
        new_status: BookingStatus,
        /// Cancellation reason.
        reason: String,
        /// Who cancelled.
        cancelled_by: Party,
        /// When the booking was cancelled.
        cancelled_at: DateTime<Utc>,
    },
    /// Confirmed → Completed.
    Complete {
        /// New status.
        new_status: BookingStatus,
        /// When the lesson was marked completed.
        completed_at: DateTime<Utc>,
    },
}

impl BookingTransition {
    /// Status after the transition.
    #[must_use]
    pub fn new_status(&self) -> BookingStatus {
        match self {
            Self::Confirm { new_status, .. }
            | Self::Cancel { new_status, .. }
            | Self::Complete { new_status, .. } => *new_status,
        }
    }

    /// Returns `booking` with the transition applied.
    #[must_use]
    pub fn apply(&self, booking: &Booking) -> Booking {
        let mut next = booking.clone();
        match self {
            Self::Confirm {
                new_status,
                confirmed_at,
            } => {
                next.status = *new_status;
                next.updated_at = *confirmed_at;
            }
            Self::Cancel {
                new_status,
                reason,
                cancelled_by,
                cancelled_at,
            } => {
                next.status = *new_status;
                next.cancellation_reason = Some(reason.clone());
                next.cancelled_by = Some(*cancelled_by);
                next.updated_at = *cancelled_at;
            }
            Self::Complete {
                new_status,
                completed_at,
            } => {
                next.status = *new_status;
                next.completed_at = Some(*completed_at);
                next.updated_at = *completed_at;
            }
        }
        next
    }
}

/// Stateless service for booking status transitions.
pub struct BookingService;

impl BookingService {
    /// Status a new booking starts in.
    #[must_use]
    pub fn initial_status(instant_confirmation: bool) -> BookingStatus {
        if instant_confirmation {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Pending
        }
    }

    /// Confirm a pending booking.
    pub fn confirm(
        current_status: BookingStatus,
        now: DateTime<Utc>,
    ) -> Result<BookingTransition, BookingError> {
        match current_status {
            BookingStatus::Pending => Ok(BookingTransition::Confirm {
                new_status: BookingStatus::Confirmed,
                confirmed_at: now,
            }),
            _ => Err(BookingError::InvalidTransition {
                from: current_status,
                to: BookingStatus::Confirmed,
            }),
        }
    }

    /// Cancel a pending or confirmed booking.
    ///
    /// # Returns
    /// * `Err(BookingError::ReasonRequired)` if the reason is blank
    /// * `Err(BookingError::InvalidTransition)` if the booking is terminal
    pub fn cancel(
        current_status: BookingStatus,
        reason: &str,
        cancelled_by: Party,
        now: DateTime<Utc>,
    ) -> Result<BookingTransition, BookingError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(BookingError::ReasonRequired);
        }

        if current_status.is_active() {
            Ok(BookingTransition::Cancel {
                new_status: BookingStatus::Cancelled,
                reason: reason.to_string(),
                cancelled_by,
                cancelled_at: now,
            })
        } else {
            Err(BookingError::InvalidTransition {
                from: current_status,
                to: BookingStatus::Cancelled,
            })
        }
    }

    /// Complete a confirmed booking whose lesson has ended.
    pub fn complete(
        current_status: BookingStatus,
        end_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<BookingTransition, BookingError> {
        if current_status != BookingStatus::Confirmed {
            return Err(BookingError::InvalidTransition {
                from: current_status,
                to: BookingStatus::Completed,
            });
        }
        if now < end_at {
            return Err(BookingError::NotYetEnded { end_at });
        }
        Ok(BookingTransition::Complete {
            new_status: BookingStatus::Completed,
            completed_at: now,
        })
    }

    /// Cancel a pending booking whose lesson start has passed.
    pub fn expire(
        current_status: BookingStatus,
        start_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<BookingTransition, BookingError> {
        if current_status != BookingStatus::Pending || now < start_at {
            return Err(BookingError::InvalidTransition {
                from: current_status,
                to: BookingStatus::Cancelled,
            });
        }
        Self::cancel(current_status, EXPIRED_REASON, Party::System, now)
    }

    /// The transition time-driven settlement applies to `booking` at `now`.
    ///
    /// Confirmed lessons that have ended are completed; pending lessons that
    /// have started are expired. Anything else is left alone.
    #[must_use]
    pub fn settle(booking: &Booking, now: DateTime<Utc>) -> Option<BookingTransition> {
        match booking.status {
            BookingStatus::Confirmed => Self::complete(booking.status, booking.end_at, now).ok(),
            BookingStatus::Pending => Self::expire(booking.status, booking.start_at, now).ok(),
            BookingStatus::Completed | BookingStatus::Cancelled => None,
        }
    }

    /// Check if a status transition is valid.
    ///
    /// Valid transitions:
    /// - Pending → Confirmed
    /// - Pending → Cancelled
    /// - Confirmed → Cancelled
    /// - Confirmed → Completed
    #[must_use]
    pub fn is_valid_transition(from: BookingStatus, to: BookingStatus) -> bool {
        matches!(
            (from, to),
            (
                BookingStatus::Pending,
                BookingStatus::Confirmed | BookingStatus::Cancelled
            ) | (
                BookingStatus::Confirmed,
                BookingStatus::Cancelled | BookingStatus::Completed
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tutora_shared::types::{BookingId, Money, StudentId, SubjectOfferingId, TeacherId};

    use crate::booking::types::BookingType;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
    }

    fn booking(status: BookingStatus, start_at: DateTime<Utc>) -> Booking {
        Booking {
            id: BookingId::new(),
            teacher_id: TeacherId::new(),
            student_id: StudentId::new(),
            subject_offering_id: SubjectOfferingId::new(),
            start_at,
            end_at: start_at + Duration::hours(1),
            status,
            booking_type: BookingType::Single,
            price: Money::from_minor(50_000),
            cancellation_reason: None,
            cancelled_by: None,
            created_at: start_at - Duration::days(3),
            updated_at: start_at - Duration::days(3),
            completed_at: None,
        }
    }

    #[test]
    fn test_initial_status() {
        assert_eq!(BookingService::initial_status(false), BookingStatus::Pending);
        assert_eq!(BookingService::initial_status(true), BookingStatus::Confirmed);
    }

    #[test]
    fn test_confirm_from_pending() {
        let transition = BookingService::confirm(BookingStatus::Pending, now()).unwrap();
        assert_eq!(transition.new_status(), BookingStatus::Confirmed);
    }

    #[test]
    fn test_confirm_twice_fails() {
        let result = BookingService::confirm(BookingStatus::Confirmed, now());
        assert!(matches!(
            result,
            Err(BookingError::InvalidTransition {
                from: BookingStatus::Confirmed,
                to: BookingStatus::Confirmed,
            })
        ));
    }

    #[test]
    fn test_cancel_requires_reason() {
        let result = BookingService::cancel(BookingStatus::Pending, "   ", Party::Student, now());
        assert_eq!(result, Err(BookingError::ReasonRequired));
    }

    #[test]
    fn test_cancel_applies_audit_fields() {
        let original = booking(BookingStatus::Confirmed, now() + Duration::days(1));
        let transition =
            BookingService::cancel(original.status, " sick ", Party::Teacher, now()).unwrap();
        let cancelled = transition.apply(&original);

        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("sick"));
        assert_eq!(cancelled.cancelled_by, Some(Party::Teacher));
        assert_eq!(cancelled.updated_at, now());
        assert_eq!(cancelled.price, original.price);
    }

    #[test]
    fn test_terminal_bookings_cannot_be_cancelled() {
        for status in [BookingStatus::Completed, BookingStatus::Cancelled] {
            assert!(BookingService::cancel(status, "late", Party::Student, now()).is_err());
        }
    }

    #[test]
    fn test_complete_only_after_end() {
        let lesson = booking(BookingStatus::Confirmed, now() - Duration::minutes(30));
        assert_eq!(
            BookingService::complete(lesson.status, lesson.end_at, now()),
            Err(BookingError::NotYetEnded {
                end_at: lesson.end_at
            })
        );

        let completed = BookingService::complete(lesson.status, lesson.end_at, lesson.end_at)
            .unwrap()
            .apply(&lesson);
        assert_eq!(completed.status, BookingStatus::Completed);
        assert_eq!(completed.completed_at, Some(lesson.end_at));
    }

    #[test]
    fn test_settle_completes_and_expires() {
        let ended = booking(BookingStatus::Confirmed, now() - Duration::hours(2));
        let started = booking(BookingStatus::Pending, now() - Duration::minutes(5));
        let upcoming = booking(BookingStatus::Pending, now() + Duration::hours(5));
        let done = booking(BookingStatus::Completed, now() - Duration::hours(5));

        assert_eq!(
            BookingService::settle(&ended, now()).map(|t| t.new_status()),
            Some(BookingStatus::Completed)
        );

        let expired = BookingService::settle(&started, now()).unwrap().apply(&started);
        assert_eq!(expired.status, BookingStatus::Cancelled);
        assert_eq!(expired.cancelled_by, Some(Party::System));
        assert_eq!(expired.cancellation_reason.as_deref(), Some(EXPIRED_REASON));

        assert!(BookingService::settle(&upcoming, now()).is_none());
        assert!(BookingService::settle(&done, now()).is_none());
    }
}

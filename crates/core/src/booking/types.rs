//! Booking domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tutora_shared::types::{BookingId, Money, StudentId, SubjectOfferingId, TeacherId};

use crate::scheduling::Interval;

/// Booking status.
///
/// Valid transitions:
/// - Pending → Confirmed (teacher or system)
/// - Pending | Confirmed → Cancelled (either party, reason required)
/// - Confirmed → Completed (once the lesson has ended)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Waiting for the teacher to confirm.
    Pending,
    /// Confirmed by the teacher.
    Confirmed,
    /// Lesson took place.
    Completed,
    /// Cancelled before the lesson.
    Cancelled,
}

impl BookingStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if the booking occupies the teacher's calendar.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of lesson booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingType {
    /// Discounted first lesson.
    Trial,
    /// One regular lesson.
    Single,
    /// Lesson that is part of a package.
    Package,
}

impl BookingType {
    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Single => "single",
            Self::Package => "package",
        }
    }

    /// Parses a type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trial" => Some(Self::Trial),
            "single" => Some(Self::Single),
            "package" => Some(Self::Package),
            _ => None,
        }
    }
}

impl fmt::Display for BookingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who performed an action on a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    /// The booking student.
    Student,
    /// The booked teacher.
    Teacher,
    /// Background jobs and administrators.
    System,
}

impl Party {
    /// Returns the string representation of the party.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::System => "system",
        }
    }

    /// Parses a party from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "student" => Some(Self::Student),
            "teacher" => Some(Self::Teacher),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// A lesson booked by a student with a teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking identifier.
    pub id: BookingId,
    /// Booked teacher.
    pub teacher_id: TeacherId,
    /// Booking student.
    pub student_id: StudentId,
    /// Offering the lesson is booked for.
    pub subject_offering_id: SubjectOfferingId,
    /// Lesson start.
    pub start_at: DateTime<Utc>,
    /// Lesson end.
    pub end_at: DateTime<Utc>,
    /// Current status.
    pub status: BookingStatus,
    /// Kind of lesson.
    pub booking_type: BookingType,
    /// Price snapshot taken when the booking was created.
    pub price: Money,
    /// Why the booking was cancelled.
    pub cancellation_reason: Option<String>,
    /// Who cancelled the booking.
    pub cancelled_by: Option<Party>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
    /// When the lesson was marked completed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// The lesson interval, `None` for a malformed row.
    #[must_use]
    pub fn interval(&self) -> Option<Interval> {
        Interval::new(self.start_at, self.end_at)
    }

    /// True if this booking shares at least one instant with `other`.
    #[must_use]
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start_at < other.end() && other.start() < self.end_at
    }

    /// Lesson length in whole minutes.
    #[must_use]
    pub fn duration_minutes(&self) -> i64 {
        (self.end_at - self.start_at).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("CONFIRMED"), Some(BookingStatus::Confirmed));
        assert_eq!(BookingStatus::parse("unknown"), None);
    }

    #[test]
    fn test_active_statuses() {
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::Confirmed.is_active());
        assert!(!BookingStatus::Completed.is_active());
        assert!(!BookingStatus::Cancelled.is_active());
        assert!(BookingStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_type_and_party_parse() {
        assert_eq!(BookingType::parse("trial"), Some(BookingType::Trial));
        assert_eq!(BookingType::Package.to_string(), "package");
        assert_eq!(Party::parse("system"), Some(Party::System));
        assert_eq!(Party::parse("admin"), None);
    }
}

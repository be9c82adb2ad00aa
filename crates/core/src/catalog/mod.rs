//! Read-only catalog data owned by the marketplace.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tutora_shared::types::{Money, SubjectOfferingId, TeacherId};

/// Booking settings of a teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherProfile {
    /// Teacher.
    pub teacher_id: TeacherId,
    /// Teacher's home timezone.
    pub timezone: Tz,
    /// Lesson lengths the teacher offers, in minutes.
    pub allowed_durations: Vec<u32>,
    /// New bookings skip the PENDING state.
    pub instant_confirmation: bool,
}

/// A subject a teacher teaches, with its price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectOffering {
    /// Offering identifier.
    pub id: SubjectOfferingId,
    /// Teacher giving the lessons.
    pub teacher_id: TeacherId,
    /// Subject name.
    pub subject: String,
    /// Price of one hour of lessons.
    pub price_per_hour: Money,
    /// Hourly price for trial lessons, defaults to `price_per_hour`.
    pub trial_price: Option<Money>,
    /// Inactive offerings cannot be booked.
    pub active: bool,
}

//! Overlap check run inside the per-teacher guard before a booking is stored.

use super::error::BookingError;
use super::types::Booking;
use crate::scheduling::Interval;

/// Pure overlap check against a teacher's existing bookings.
pub struct ConflictResolver;

impl ConflictResolver {
    /// Fails with `SlotTaken` if `candidate` overlaps any active booking of
    /// the same teacher in `existing`.
    pub fn ensure_free(existing: &[Booking], candidate: &Booking) -> Result<(), BookingError> {
        let interval = candidate.interval().ok_or_else(|| {
            BookingError::Validation("booking must end after it starts".to_string())
        })?;

        let taken = existing.iter().any(|booking| {
            booking.id != candidate.id
                && booking.teacher_id == candidate.teacher_id
                && booking.status.is_active()
                && booking.overlaps(&interval)
        });

        if taken {
            return Err(BookingError::SlotTaken {
                teacher_id: candidate.teacher_id,
                start_at: candidate.start_at,
                end_at: candidate.end_at,
            });
        }
        Ok(())
    }

    /// The busy intervals of the active bookings in `bookings`.
    #[must_use]
    pub fn busy_intervals(bookings: &[Booking]) -> Vec<Interval> {
        bookings
            .iter()
            .filter(|booking| booking.status.is_active())
            .filter_map(Booking::interval)
            .collect()
    }
}

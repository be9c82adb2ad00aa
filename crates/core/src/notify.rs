//! Outbound notifications.
//!
//! Delivery is fire-and-forget: engines never wait for or fail on a
//! notification.

use serde::Serialize;
use tutora_shared::types::{BookingId, Money, PayoutRequestId, StudentId, TeacherId};

#[cfg(test)]
use mockall::automock;

use crate::booking::Party;
use crate::payout::PayoutStatus;

/// Events worth telling a teacher or student about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    /// A student asked for a lesson that needs confirmation.
    BookingRequested {
        /// Booking.
        booking_id: BookingId,
        /// Teacher to confirm.
        teacher_id: TeacherId,
        /// Student who booked.
        student_id: StudentId,
    },
    /// A lesson is confirmed.
    BookingConfirmed {
        /// Booking.
        booking_id: BookingId,
        /// Teacher.
        teacher_id: TeacherId,
        /// Student.
        student_id: StudentId,
    },
    /// A lesson was cancelled.
    BookingCancelled {
        /// Booking.
        booking_id: BookingId,
        /// Teacher.
        teacher_id: TeacherId,
        /// Student.
        student_id: StudentId,
        /// Who cancelled.
        cancelled_by: Party,
    },
    /// An earning was credited to the teacher's wallet.
    EarningRecorded {
        /// Teacher.
        teacher_id: TeacherId,
        /// Completed booking.
        booking_id: BookingId,
        /// Net amount credited.
        net: Money,
    },
    /// An earning was reversed.
    EarningReversed {
        /// Teacher.
        teacher_id: TeacherId,
        /// Booking whose earning was reversed.
        booking_id: BookingId,
        /// Net amount debited.
        net: Money,
    },
    /// A payout request changed status.
    PayoutUpdated {
        /// Payout.
        payout_id: PayoutRequestId,
        /// Teacher.
        teacher_id: TeacherId,
        /// New status.
        status: PayoutStatus,
    },
}

/// Sink for notifications.
#[cfg_attr(test, automock)]
pub trait Notifier: Send + Sync {
    /// Hands a notification to the delivery channel without waiting.
    fn notify(&self, notification: Notification);
}

/// Notifier that writes notifications to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        tracing::info!(?notification, "Notification dispatched");
    }
}

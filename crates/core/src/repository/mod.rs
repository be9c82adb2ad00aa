//! Persistence seams.
//!
//! Engines talk to storage only through these traits. Every mutating method
//! is atomic. Methods that must see a stable view of one teacher's calendar
//! or ledger run under that teacher's guard and fail fast with
//! `StoreError::Busy` (surfaced as `ConcurrentModification`) instead of
//! waiting for it.

mod error;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tutora_shared::types::{
    AvailabilityRuleId, BookingId, Money, PageRequest, PayoutRequestId, SubjectOfferingId,
    TeacherId,
};

#[cfg(test)]
use mockall::automock;

pub use error::StoreError;

use crate::availability::{AvailabilityError, AvailabilityRule};
use crate::booking::{Booking, BookingError, BookingStatus};
use crate::catalog::{SubjectOffering, TeacherProfile};
use crate::payout::{PayoutAllocation, PayoutDraft, PayoutError, PayoutRequest, PayoutStatus};
use crate::scheduling::Interval;
use crate::wallet::{LedgerSnapshot, WalletEntry, WalletError};

/// Read-only catalog of teachers and their offerings.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Booking settings of a teacher.
    async fn teacher_profile(&self, teacher_id: TeacherId)
    -> Result<Option<TeacherProfile>, StoreError>;

    /// A subject offering by id.
    async fn subject_offering(
        &self,
        id: SubjectOfferingId,
    ) -> Result<Option<SubjectOffering>, StoreError>;
}

/// Teacher availability rules.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// All rules of a teacher.
    async fn rules_for_teacher(
        &self,
        teacher_id: TeacherId,
    ) -> Result<Vec<AvailabilityRule>, StoreError>;

    /// A rule by id.
    async fn find_rule(&self, id: AvailabilityRuleId)
    -> Result<Option<AvailabilityRule>, StoreError>;

    /// Inserts or replaces a rule.
    ///
    /// A teacher has at most one exception per local date; saving a second
    /// one fails with `AvailabilityError::DuplicateException`.
    async fn save_rule(&self, rule: &AvailabilityRule) -> Result<(), AvailabilityError>;

    /// Deletes a rule, returning whether it existed.
    async fn delete_rule(
        &self,
        teacher_id: TeacherId,
        id: AvailabilityRuleId,
    ) -> Result<bool, StoreError>;
}

/// Bookings.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// A booking by id.
    async fn find_booking(&self, id: BookingId) -> Result<Option<Booking>, StoreError>;

    /// PENDING and CONFIRMED bookings of a teacher overlapping `window`.
    async fn active_bookings(
        &self,
        teacher_id: TeacherId,
        window: Interval,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Stores a new booking if it overlaps no active booking of its teacher.
    ///
    /// Runs under the teacher's guard and fails with `SlotTaken` on overlap.
    async fn reserve(&self, booking: Booking) -> Result<Booking, BookingError>;

    /// Persists a status change if the stored status is still `expected`.
    async fn update_booking(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<Booking, BookingError>;

    /// A page of a teacher's bookings, newest lesson first, plus the total count.
    async fn bookings_for_teacher(
        &self,
        teacher_id: TeacherId,
        page: PageRequest,
    ) -> Result<(Vec<Booking>, u64), StoreError>;

    /// Confirmed bookings that ended and pending bookings that started by `now`.
    async fn due_for_settlement(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Booking>, StoreError>;

    /// Completed bookings that have no earning entry yet.
    async fn completed_without_earning(&self, limit: u64) -> Result<Vec<Booking>, StoreError>;
}

/// Append-only wallet ledger.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Stores an earning unless one exists for its booking; returns the stored one.
    async fn record_earning(&self, entry: WalletEntry) -> Result<WalletEntry, WalletError>;

    /// The earning entry of a booking.
    async fn earning_for_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<WalletEntry>, StoreError>;

    /// Appends the reversal of a booking's earning under the teacher's guard.
    async fn reverse_earning(
        &self,
        booking_id: BookingId,
        now: DateTime<Utc>,
    ) -> Result<WalletEntry, WalletError>;

    /// Entries and allocations of a teacher.
    async fn ledger_snapshot(&self, teacher_id: TeacherId) -> Result<LedgerSnapshot, StoreError>;

    /// A page of a teacher's entries, newest first, plus the total count.
    async fn entries_for_teacher(
        &self,
        teacher_id: TeacherId,
        page: PageRequest,
    ) -> Result<(Vec<WalletEntry>, u64), StoreError>;

    /// Teachers with unreversed pending earnings whose hold period ended by `now`.
    async fn teachers_with_matured(&self, now: DateTime<Utc>)
    -> Result<Vec<TeacherId>, StoreError>;

    /// Promotes matured, unreversed earnings of one teacher under its guard.
    async fn promote_matured(
        &self,
        teacher_id: TeacherId,
        now: DateTime<Utc>,
    ) -> Result<Vec<WalletEntry>, StoreError>;
}

/// Payout requests and their allocations.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PayoutStore: Send + Sync {
    /// Plans and stores a payout with its allocations under the teacher's guard.
    async fn create_payout(
        &self,
        draft: PayoutDraft,
        minimum: Money,
        now: DateTime<Utc>,
    ) -> Result<(PayoutRequest, Vec<PayoutAllocation>), PayoutError>;

    /// A payout by id.
    async fn find_payout(&self, id: PayoutRequestId) -> Result<Option<PayoutRequest>, StoreError>;

    /// Allocations of a payout.
    async fn allocations(&self, id: PayoutRequestId) -> Result<Vec<PayoutAllocation>, StoreError>;

    /// Persists a status change if the stored status is still `expected`.
    ///
    /// Moving to `Paid` also marks fully covered wallet entries as paid.
    async fn update_payout(
        &self,
        payout: &PayoutRequest,
        expected: PayoutStatus,
    ) -> Result<PayoutRequest, PayoutError>;

    /// A page of a teacher's payouts, newest first, plus the total count.
    async fn payouts_for_teacher(
        &self,
        teacher_id: TeacherId,
        page: PageRequest,
    ) -> Result<(Vec<PayoutRequest>, u64), StoreError>;
}

//! In-memory store for development and tests.
//!
//! Tables are `DashMap`s. The per-teacher guard is a tokio mutex that is
//! only ever tried, so contention surfaces as `StoreError::Busy` exactly as
//! the PostgreSQL advisory lock does. Guarded sections never await.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tutora_core::availability::{AvailabilityError, AvailabilityRule};
use tutora_core::booking::{Booking, BookingError, BookingStatus};
use tutora_core::catalog::{SubjectOffering, TeacherProfile};
use tutora_core::payout::{
    PayoutAllocation, PayoutDraft, PayoutError, PayoutRequest, PayoutService, PayoutStatus,
};
use tutora_core::repository::{
    AvailabilityStore, BookingStore, CatalogStore, PayoutStore, StoreError, WalletStore,
};
use tutora_core::scheduling::Interval;
use tutora_core::wallet::{
    AllocationState, LedgerService, LedgerSnapshot, WalletEntry, WalletEntryKind,
    WalletEntryStatus, WalletError,
};
use tutora_shared::types::{
    AvailabilityRuleId, BookingId, Money, PageRequest, PayoutRequestId, SubjectOfferingId,
    TeacherId, WalletEntryId,
};

/// Store keeping every table in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    profiles: DashMap<TeacherId, TeacherProfile>,
    offerings: DashMap<SubjectOfferingId, SubjectOffering>,
    rules: DashMap<AvailabilityRuleId, AvailabilityRule>,
    bookings: DashMap<BookingId, Booking>,
    entries: DashMap<WalletEntryId, WalletEntry>,
    payouts: DashMap<PayoutRequestId, PayoutRequest>,
    allocations: DashMap<PayoutRequestId, Vec<PayoutAllocation>>,
    guards: DashMap<TeacherId, Arc<Mutex<()>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a teacher profile.
    pub fn upsert_teacher(&self, profile: TeacherProfile) {
        self.profiles.insert(profile.teacher_id, profile);
    }

    /// Inserts or replaces a subject offering.
    pub fn upsert_offering(&self, offering: SubjectOffering) {
        self.offerings.insert(offering.id, offering);
    }

    /// Tries to take the teacher's guard without waiting.
    pub fn try_guard(&self, teacher_id: TeacherId) -> Result<OwnedMutexGuard<()>, StoreError> {
        let lock = self.guards.entry(teacher_id).or_default().clone();
        lock.try_lock_owned()
            .map_err(|_| StoreError::Busy(teacher_id))
    }

    fn snapshot(&self, teacher_id: TeacherId) -> LedgerSnapshot {
        let mut entries: Vec<WalletEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.teacher_id == teacher_id)
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by_key(|entry| (entry.created_at, entry.id));

        let allocations = self
            .payouts
            .iter()
            .filter(|payout| payout.teacher_id == teacher_id)
            .flat_map(|payout| {
                let payout_status = payout.status;
                self.allocations
                    .get(&payout.id)
                    .map(|rows| rows.value().clone())
                    .unwrap_or_default()
                    .into_iter()
                    .map(move |allocation| AllocationState {
                        allocation,
                        payout_status,
                    })
            })
            .collect();

        LedgerSnapshot {
            entries,
            allocations,
        }
    }

    fn find_entry(&self, booking_id: BookingId, kind: WalletEntryKind) -> Option<WalletEntry> {
        self.entries
            .iter()
            .find(|entry| entry.booking_id == booking_id && entry.kind == kind)
            .map(|entry| entry.value().clone())
    }

    fn set_entry_status(&self, ids: &[WalletEntryId], status: WalletEntryStatus) {
        for id in ids {
            if let Some(mut entry) = self.entries.get_mut(id) {
                entry.status = status;
            }
        }
    }
}

fn page_of<T>(mut rows: Vec<T>, page: PageRequest) -> (Vec<T>, u64) {
    let total = rows.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    let rows = if offset >= rows.len() {
        Vec::new()
    } else {
        rows.drain(offset..).take(limit).collect()
    };
    (rows, total)
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn teacher_profile(
        &self,
        teacher_id: TeacherId,
    ) -> Result<Option<TeacherProfile>, StoreError> {
        Ok(self.profiles.get(&teacher_id).map(|p| p.value().clone()))
    }

    async fn subject_offering(
        &self,
        id: SubjectOfferingId,
    ) -> Result<Option<SubjectOffering>, StoreError> {
        Ok(self.offerings.get(&id).map(|o| o.value().clone()))
    }
}

#[async_trait]
impl AvailabilityStore for MemoryStore {
    async fn rules_for_teacher(
        &self,
        teacher_id: TeacherId,
    ) -> Result<Vec<AvailabilityRule>, StoreError> {
        let mut rules: Vec<AvailabilityRule> = self
            .rules
            .iter()
            .filter(|rule| rule.teacher_id() == teacher_id)
            .map(|rule| rule.value().clone())
            .collect();
        rules.sort_by_key(AvailabilityRule::id);
        Ok(rules)
    }

    async fn find_rule(
        &self,
        id: AvailabilityRuleId,
    ) -> Result<Option<AvailabilityRule>, StoreError> {
        Ok(self.rules.get(&id).map(|rule| rule.value().clone()))
    }

    async fn save_rule(&self, rule: &AvailabilityRule) -> Result<(), AvailabilityError> {
        let _guard = self.try_guard(rule.teacher_id())?;
        if let AvailabilityRule::Exception(exception) = rule {
            let taken = self.rules.iter().any(|existing| {
                existing.id() != rule.id()
                    && matches!(
                        existing.value(),
                        AvailabilityRule::Exception(other)
                            if other.teacher_id == exception.teacher_id
                                && other.date == exception.date
                    )
            });
            if taken {
                return Err(AvailabilityError::DuplicateException(exception.date));
            }
        }
        self.rules.insert(rule.id(), rule.clone());
        Ok(())
    }

    async fn delete_rule(
        &self,
        teacher_id: TeacherId,
        id: AvailabilityRuleId,
    ) -> Result<bool, StoreError> {
        Ok(self
            .rules
            .remove_if(&id, |_, rule| rule.teacher_id() == teacher_id)
            .is_some())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn find_booking(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.get(&id).map(|b| b.value().clone()))
    }

    async fn active_bookings(
        &self,
        teacher_id: TeacherId,
        window: Interval,
    ) -> Result<Vec<Booking>, StoreError> {
        let mut active: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| b.teacher_id == teacher_id && b.status.is_active() && b.overlaps(&window))
            .map(|b| b.value().clone())
            .collect();
        active.sort_by_key(|b| b.start_at);
        Ok(active)
    }

    async fn reserve(&self, booking: Booking) -> Result<Booking, BookingError> {
        let _guard = self.try_guard(booking.teacher_id)?;

        let taken = self.bookings.iter().any(|existing| {
            existing.teacher_id == booking.teacher_id
                && existing.status.is_active()
                && existing.start_at < booking.end_at
                && booking.start_at < existing.end_at
        });
        if taken {
            return Err(BookingError::SlotTaken {
                teacher_id: booking.teacher_id,
                start_at: booking.start_at,
                end_at: booking.end_at,
            });
        }

        self.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn update_booking(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<Booking, BookingError> {
        let mut stored = self
            .bookings
            .get_mut(&booking.id)
            .ok_or(BookingError::NotFound(booking.id))?;
        if stored.status != expected {
            return Err(BookingError::InvalidTransition {
                from: stored.status,
                to: booking.status,
            });
        }
        *stored = booking.clone();
        Ok(booking.clone())
    }

    async fn bookings_for_teacher(
        &self,
        teacher_id: TeacherId,
        page: PageRequest,
    ) -> Result<(Vec<Booking>, u64), StoreError> {
        let mut rows: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| b.teacher_id == teacher_id)
            .map(|b| b.value().clone())
            .collect();
        rows.sort_by(|a, b| (b.start_at, b.id).cmp(&(a.start_at, a.id)));
        Ok(page_of(rows, page))
    }

    async fn due_for_settlement(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Booking>, StoreError> {
        let mut due: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| match b.status {
                BookingStatus::Confirmed => b.end_at <= now,
                BookingStatus::Pending => b.start_at <= now,
                BookingStatus::Completed | BookingStatus::Cancelled => false,
            })
            .map(|b| b.value().clone())
            .collect();
        due.sort_by_key(|b| b.end_at);
        due.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(due)
    }

    async fn completed_without_earning(&self, limit: u64) -> Result<Vec<Booking>, StoreError> {
        let mut missing: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Completed)
            .map(|b| b.value().clone())
            .filter(|b| self.find_entry(b.id, WalletEntryKind::Earning).is_none())
            .collect();
        missing.sort_by_key(|b| b.completed_at);
        missing.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(missing)
    }
}

#[async_trait]
impl WalletStore for MemoryStore {
    async fn record_earning(&self, entry: WalletEntry) -> Result<WalletEntry, WalletError> {
        let _guard = self.try_guard(entry.teacher_id)?;

        if let Some(existing) = self.find_entry(entry.booking_id, WalletEntryKind::Earning) {
            return Ok(existing);
        }
        self.entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn earning_for_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<WalletEntry>, StoreError> {
        Ok(self.find_entry(booking_id, WalletEntryKind::Earning))
    }

    async fn reverse_earning(
        &self,
        booking_id: BookingId,
        now: DateTime<Utc>,
    ) -> Result<WalletEntry, WalletError> {
        let teacher_id = self
            .find_entry(booking_id, WalletEntryKind::Earning)
            .ok_or(WalletError::EarningNotFound(booking_id))?
            .teacher_id;
        let _guard = self.try_guard(teacher_id)?;

        let original = self
            .find_entry(booking_id, WalletEntryKind::Earning)
            .ok_or(WalletError::EarningNotFound(booking_id))?;
        let already_reversed = self
            .find_entry(booking_id, WalletEntryKind::Reversal)
            .is_some();

        let reversal = LedgerService::reversal_for(&original, already_reversed, now)?;
        self.entries.insert(reversal.id, reversal.clone());
        Ok(reversal)
    }

    async fn ledger_snapshot(&self, teacher_id: TeacherId) -> Result<LedgerSnapshot, StoreError> {
        Ok(self.snapshot(teacher_id))
    }

    async fn entries_for_teacher(
        &self,
        teacher_id: TeacherId,
        page: PageRequest,
    ) -> Result<(Vec<WalletEntry>, u64), StoreError> {
        let mut rows = self.snapshot(teacher_id).entries;
        rows.reverse();
        Ok(page_of(rows, page))
    }

    async fn teachers_with_matured(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<TeacherId>, StoreError> {
        let reversed: HashSet<WalletEntryId> =
            self.entries.iter().filter_map(|entry| entry.reverses).collect();
        let mut teachers: Vec<TeacherId> = self
            .entries
            .iter()
            .filter(|entry| {
                entry.kind == WalletEntryKind::Earning
                    && entry.status == WalletEntryStatus::Pending
                    && entry.available_at <= now
                    && !reversed.contains(&entry.id)
            })
            .map(|entry| entry.teacher_id)
            .collect();
        teachers.sort();
        teachers.dedup();
        Ok(teachers)
    }

    async fn promote_matured(
        &self,
        teacher_id: TeacherId,
        now: DateTime<Utc>,
    ) -> Result<Vec<WalletEntry>, StoreError> {
        let _guard = self.try_guard(teacher_id)?;

        let matured = self.snapshot(teacher_id).matured(now);
        self.set_entry_status(&matured, WalletEntryStatus::Available);
        Ok(matured
            .iter()
            .filter_map(|id| self.entries.get(id).map(|entry| entry.value().clone()))
            .collect())
    }
}

#[async_trait]
impl PayoutStore for MemoryStore {
    async fn create_payout(
        &self,
        draft: PayoutDraft,
        minimum: Money,
        now: DateTime<Utc>,
    ) -> Result<(PayoutRequest, Vec<PayoutAllocation>), PayoutError> {
        let _guard = self.try_guard(draft.teacher_id)?;

        let planned = PayoutService::plan(&draft, &self.snapshot(draft.teacher_id), minimum, now)?;
        self.allocations
            .insert(planned.request.id, planned.allocations.clone());
        self.payouts
            .insert(planned.request.id, planned.request.clone());
        Ok((planned.request, planned.allocations))
    }

    async fn find_payout(&self, id: PayoutRequestId) -> Result<Option<PayoutRequest>, StoreError> {
        Ok(self.payouts.get(&id).map(|p| p.value().clone()))
    }

    async fn allocations(&self, id: PayoutRequestId) -> Result<Vec<PayoutAllocation>, StoreError> {
        Ok(self
            .allocations
            .get(&id)
            .map(|rows| rows.value().clone())
            .unwrap_or_default())
    }

    async fn update_payout(
        &self,
        payout: &PayoutRequest,
        expected: PayoutStatus,
    ) -> Result<PayoutRequest, PayoutError> {
        let _guard = self.try_guard(payout.teacher_id)?;

        {
            let mut stored = self
                .payouts
                .get_mut(&payout.id)
                .ok_or(PayoutError::NotFound(payout.id))?;
            if stored.status != expected {
                return Err(PayoutError::InvalidTransition {
                    from: stored.status,
                    to: payout.status,
                });
            }
            *stored = payout.clone();
        }

        if payout.status == PayoutStatus::Paid {
            let paid = self.snapshot(payout.teacher_id).fully_paid();
            self.set_entry_status(&paid, WalletEntryStatus::Paid);
        }
        Ok(payout.clone())
    }

    async fn payouts_for_teacher(
        &self,
        teacher_id: TeacherId,
        page: PageRequest,
    ) -> Result<(Vec<PayoutRequest>, u64), StoreError> {
        let mut rows: Vec<PayoutRequest> = self
            .payouts
            .iter()
            .filter(|p| p.teacher_id == teacher_id)
            .map(|p| p.value().clone())
            .collect();
        rows.sort_by(|a, b| (b.requested_at, b.id).cmp(&(a.requested_at, a.id)));
        Ok(page_of(rows, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tutora_core::booking::BookingType;
    use tutora_shared::types::StudentId;

    fn lesson(teacher_id: TeacherId, start_hour: u32, minutes: i64) -> Booking {
        let start_at = Utc.with_ymd_and_hms(2026, 3, 2, start_hour, 0, 0).unwrap();
        Booking {
            id: BookingId::new(),
            teacher_id,
            student_id: StudentId::new(),
            subject_offering_id: SubjectOfferingId::new(),
            start_at,
            end_at: start_at + Duration::minutes(minutes),
            status: BookingStatus::Pending,
            booking_type: BookingType::Single,
            price: Money::from_minor(50_000),
            cancellation_reason: None,
            cancelled_by: None,
            created_at: start_at - Duration::days(1),
            updated_at: start_at - Duration::days(1),
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn test_reserve_rejects_overlap_but_allows_touching() {
        let store = MemoryStore::new();
        let teacher_id = TeacherId::new();

        store.reserve(lesson(teacher_id, 9, 60)).await.unwrap();
        assert!(matches!(
            store.reserve(lesson(teacher_id, 9, 30)).await,
            Err(BookingError::SlotTaken { .. })
        ));
        store.reserve(lesson(teacher_id, 10, 60)).await.unwrap();
        store.reserve(lesson(TeacherId::new(), 9, 60)).await.unwrap();
    }

    #[tokio::test]
    async fn test_busy_guard_fails_fast() {
        let store = MemoryStore::new();
        let teacher_id = TeacherId::new();
        let _held = store.try_guard(teacher_id).unwrap();

        assert_eq!(
            store.reserve(lesson(teacher_id, 9, 60)).await,
            Err(BookingError::ConcurrentModification)
        );
        assert_eq!(
            store.promote_matured(teacher_id, Utc::now()).await,
            Err(StoreError::Busy(teacher_id))
        );
    }

    #[tokio::test]
    async fn test_update_booking_compares_status() {
        let store = MemoryStore::new();
        let booking = store.reserve(lesson(TeacherId::new(), 9, 60)).await.unwrap();

        let mut confirmed = booking.clone();
        confirmed.status = BookingStatus::Confirmed;
        store
            .update_booking(&confirmed, BookingStatus::Pending)
            .await
            .unwrap();

        assert_eq!(
            store.update_booking(&confirmed, BookingStatus::Pending).await,
            Err(BookingError::InvalidTransition {
                from: BookingStatus::Confirmed,
                to: BookingStatus::Confirmed,
            })
        );
    }

    #[test]
    fn test_page_of_past_end_is_empty() {
        let (rows, total) = page_of(vec![1, 2, 3], PageRequest::new(3, 2));
        assert!(rows.is_empty());
        assert_eq!(total, 3);

        let (rows, _) = page_of(vec![1, 2, 3], PageRequest::new(2, 2));
        assert_eq!(rows, vec![3]);
    }
}

//! The periodic settlement pass.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::booking::BookingEngine;
use super::wallet::{SweepReport, WalletEngine};

/// Counts from one settlement run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettlementReport {
    /// Bookings completed.
    pub completed: usize,
    /// Pending bookings expired.
    pub expired: usize,
    /// Earnings recorded, including backfilled ones.
    pub earnings: usize,
    /// Sweep outcome.
    pub sweep: SweepReport,
}

/// Completes due bookings, records their earnings and promotes matured
/// entries. Every step logs and continues on failure so one bad step never
/// blocks the others.
#[derive(Clone)]
pub struct SettlementJob {
    bookings: Arc<BookingEngine>,
    wallet: Arc<WalletEngine>,
}

impl SettlementJob {
    /// Creates the job.
    pub fn new(bookings: Arc<BookingEngine>, wallet: Arc<WalletEngine>) -> Self {
        Self { bookings, wallet }
    }

    /// Runs one pass.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, now: DateTime<Utc>) -> SettlementReport {
        let mut report = SettlementReport::default();

        match self.bookings.settle_due(now).await {
            Ok(settled) => {
                report.completed = settled.completed.len();
                report.expired = settled.expired;
                for booking in &settled.completed {
                    match self.wallet.record_earning(booking, now).await {
                        Ok(_) => report.earnings += 1,
                        Err(err) => tracing::warn!(
                            booking_id = %booking.id,
                            error = %err,
                            "Earning deferred to backfill"
                        ),
                    }
                }
            }
            Err(err) => tracing::error!(error = %err, "Booking settlement failed"),
        }

        match self.wallet.backfill_earnings(now).await {
            Ok(recorded) => report.earnings += recorded,
            Err(err) => tracing::error!(error = %err, "Earning backfill failed"),
        }

        match self.wallet.sweep(now).await {
            Ok(sweep) => report.sweep = sweep,
            Err(err) => tracing::error!(error = %err, "Wallet sweep failed"),
        }

        tracing::info!(
            completed = report.completed,
            expired = report.expired,
            earnings = report.earnings,
            promoted = report.sweep.promoted,
            "Settlement run finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{Booking, BookingStatus, BookingType};
    use crate::notify::MockNotifier;
    use crate::repository::{
        MockAvailabilityStore, MockBookingStore, MockCatalogStore, MockWalletStore, StoreError,
    };
    use crate::scheduling::SlotGenerator;
    use crate::wallet::CommissionSchedule;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use tutora_shared::types::{BookingId, Money, StudentId, SubjectOfferingId, TeacherId};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
    }

    fn confirmed_lesson() -> Booking {
        Booking {
            id: BookingId::new(),
            teacher_id: TeacherId::new(),
            student_id: StudentId::new(),
            subject_offering_id: SubjectOfferingId::new(),
            start_at: t0() - Duration::hours(2),
            end_at: t0() - Duration::hours(1),
            status: BookingStatus::Confirmed,
            booking_type: BookingType::Single,
            price: Money::from_minor(50_000),
            cancellation_reason: None,
            cancelled_by: None,
            created_at: t0() - Duration::days(2),
            updated_at: t0() - Duration::days(2),
            completed_at: None,
        }
    }

    fn job(bookings: MockBookingStore, wallet: MockWalletStore) -> SettlementJob {
        let bookings: Arc<MockBookingStore> = Arc::new(bookings);
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().return_const(());
        let notifier = Arc::new(notifier);

        let booking_engine = BookingEngine::new(
            Arc::new(MockCatalogStore::new()),
            Arc::new(MockAvailabilityStore::new()),
            bookings.clone(),
            notifier.clone(),
            SlotGenerator::default(),
        );
        let wallet_engine = WalletEngine::new(
            Arc::new(wallet),
            bookings,
            notifier,
            CommissionSchedule::flat(dec!(0.15)).unwrap(),
            Duration::hours(72),
        );
        SettlementJob::new(Arc::new(booking_engine), Arc::new(wallet_engine))
    }

    #[tokio::test]
    async fn test_run_completes_and_records_earning() {
        let lesson = confirmed_lesson();
        let mut bookings = MockBookingStore::new();
        bookings
            .expect_due_for_settlement()
            .returning(move |_, _| Ok(vec![lesson.clone()]));
        bookings
            .expect_update_booking()
            .returning(|next, _| Ok(next.clone()));
        bookings
            .expect_completed_without_earning()
            .returning(|_| Ok(Vec::new()));

        let mut wallet = MockWalletStore::new();
        wallet
            .expect_record_earning()
            .withf(|entry| entry.commission == Money::from_minor(7_500))
            .times(1)
            .returning(Ok);
        wallet
            .expect_teachers_with_matured()
            .returning(|_| Ok(Vec::new()));

        let report = job(bookings, wallet).run(t0()).await;

        assert_eq!(report.completed, 1);
        assert_eq!(report.earnings, 1);
        assert_eq!(report.sweep, SweepReport::default());
    }

    #[tokio::test]
    async fn test_run_continues_after_failures() {
        let mut bookings = MockBookingStore::new();
        bookings
            .expect_due_for_settlement()
            .returning(|_, _| Err(StoreError::Database("connection reset".to_string())));
        bookings
            .expect_completed_without_earning()
            .returning(|_| Err(StoreError::Database("connection reset".to_string())));

        let teacher_id = TeacherId::new();
        let mut wallet = MockWalletStore::new();
        wallet
            .expect_teachers_with_matured()
            .returning(move |_| Ok(vec![teacher_id]));
        wallet.expect_promote_matured().times(1).returning(|_, _| Ok(Vec::new()));

        let report = job(bookings, wallet).run(t0()).await;

        assert_eq!(report.completed, 0);
        assert_eq!(report.earnings, 0);
        assert_eq!(report.sweep.teachers, 1);
    }
}

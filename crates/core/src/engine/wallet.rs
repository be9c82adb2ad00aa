//! Wallet orchestration: earnings, reversals, the maturation sweep and balances.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tutora_shared::types::{BookingId, PageRequest, PageResponse, TeacherId};

use crate::booking::Booking;
use crate::notify::{Notification, Notifier};
use crate::repository::{BookingStore, StoreError, WalletStore};
use crate::wallet::{CommissionSchedule, LedgerService, WalletBalance, WalletEntry, WalletError};

/// Completed bookings backfilled per run.
const BACKFILL_BATCH: u64 = 500;

/// Outcome of one sweep run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Teachers whose entries were examined.
    pub teachers: usize,
    /// Entries promoted to `Available`.
    pub promoted: usize,
    /// Teachers skipped because their ledger was busy.
    pub busy: usize,
    /// Teachers skipped because of a storage failure.
    pub failed: usize,
}

/// Coordinates the wallet and booking stores.
#[derive(Clone)]
pub struct WalletEngine {
    wallet: Arc<dyn WalletStore>,
    bookings: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
    commission: CommissionSchedule,
    hold_period: Duration,
}

impl WalletEngine {
    /// Creates the engine.
    pub fn new(
        wallet: Arc<dyn WalletStore>,
        bookings: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        commission: CommissionSchedule,
        hold_period: Duration,
    ) -> Self {
        Self {
            wallet,
            bookings,
            notifier,
            commission,
            hold_period,
        }
    }

    /// Records the earning of a completed booking. Idempotent per booking.
    pub async fn record_earning(
        &self,
        booking: &Booking,
        now: DateTime<Utc>,
    ) -> Result<WalletEntry, WalletError> {
        let entry = LedgerService::earning_for(booking, &self.commission, self.hold_period, now)?;
        let new_id = entry.id;
        let stored = self.wallet.record_earning(entry).await?;

        if stored.id == new_id {
            tracing::info!(
                teacher_id = %stored.teacher_id,
                booking_id = %stored.booking_id,
                amount = %stored.amount,
                commission = %stored.commission,
                available_at = %stored.available_at,
                "Earning recorded"
            );
            self.notifier.notify(Notification::EarningRecorded {
                teacher_id: stored.teacher_id,
                booking_id: stored.booking_id,
                net: stored.net(),
            });
        }
        Ok(stored)
    }

    /// Records earnings for completed bookings that still lack one.
    ///
    /// Returns how many were recorded.
    pub async fn backfill_earnings(&self, now: DateTime<Utc>) -> Result<usize, WalletError> {
        let missing = self.bookings.completed_without_earning(BACKFILL_BATCH).await?;
        let mut recorded = 0;
        for booking in &missing {
            match self.record_earning(booking, now).await {
                Ok(_) => recorded += 1,
                Err(err) if err.is_retryable() => {
                    tracing::debug!(booking_id = %booking.id, "Earning backfill deferred");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(recorded)
    }

    /// Offsets a booking's earning with a reversal entry.
    pub async fn reverse_earning(
        &self,
        booking_id: BookingId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<WalletEntry, WalletError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WalletError::Validation("reversal reason is required".to_string()));
        }
        if self.bookings.find_booking(booking_id).await?.is_none() {
            return Err(WalletError::BookingNotFound(booking_id));
        }

        let reversal = self.wallet.reverse_earning(booking_id, now).await?;

        tracing::info!(
            teacher_id = %reversal.teacher_id,
            %booking_id,
            status = %reversal.status,
            net = %reversal.net(),
            reason,
            "Earning reversed"
        );
        self.notifier.notify(Notification::EarningReversed {
            teacher_id: reversal.teacher_id,
            booking_id,
            net: reversal.net(),
        });
        Ok(reversal)
    }

    /// Promotes matured earnings for every teacher.
    ///
    /// Busy teachers are skipped and handled by the next run.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, WalletError> {
        let teachers = self.wallet.teachers_with_matured(now).await?;
        let mut report = SweepReport {
            teachers: teachers.len(),
            ..SweepReport::default()
        };

        for teacher_id in teachers {
            match self.wallet.promote_matured(teacher_id, now).await {
                Ok(promoted) => report.promoted += promoted.len(),
                Err(StoreError::Busy(_)) => {
                    tracing::debug!(%teacher_id, "Ledger busy, sweep deferred");
                    report.busy += 1;
                }
                Err(StoreError::Database(message)) => {
                    tracing::error!(%teacher_id, error = %message, "Sweep failed for teacher");
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            teachers = report.teachers,
            promoted = report.promoted,
            busy = report.busy,
            failed = report.failed,
            "Wallet sweep finished"
        );
        Ok(report)
    }

    /// Current balance of a teacher.
    pub async fn balance(&self, teacher_id: TeacherId) -> Result<WalletBalance, WalletError> {
        Ok(self.wallet.ledger_snapshot(teacher_id).await?.balance())
    }

    /// A page of a teacher's entries.
    pub async fn list_entries(
        &self,
        teacher_id: TeacherId,
        page: PageRequest,
    ) -> Result<PageResponse<WalletEntry>, WalletError> {
        let page = page.normalized();
        let (entries, total) = self.wallet.entries_for_teacher(teacher_id, page).await?;
        Ok(PageResponse::new(entries, page, total))
    }
}

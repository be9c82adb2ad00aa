//! Wallet ledger rules: entry creation, reversal, maturation and balances.
//!
//! Balances are never stored. They are folded from the entries plus the
//! payout allocations, weighted by each payout's current status.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tutora_shared::types::{Money, WalletEntryId};

use super::commission::CommissionSchedule;
use super::error::WalletError;
use super::types::{WalletBalance, WalletEntry, WalletEntryKind, WalletEntryStatus};
use crate::booking::{Booking, BookingStatus};
use crate::payout::{PayoutAllocation, PayoutStatus};

/// An allocation together with the current status of its payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationState {
    /// The allocation row.
    pub allocation: PayoutAllocation,
    /// Status of the payout it belongs to.
    pub payout_status: PayoutStatus,
}

/// How much of one entry is held, paid and still free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPosition {
    /// Entry.
    pub entry_id: WalletEntryId,
    /// Entry status.
    pub status: WalletEntryStatus,
    /// Entry creation time, the FIFO key.
    pub created_at: DateTime<Utc>,
    /// Net value of the entry.
    pub net: Money,
    /// Allocated to payouts in flight.
    pub reserved: Money,
    /// Allocated to paid payouts.
    pub paid: Money,
    /// Not allocated to any live or paid payout.
    pub unallocated: Money,
}

impl EntryPosition {
    /// Part of the entry a new payout may take.
    #[must_use]
    pub fn spendable(&self) -> Money {
        match self.status {
            WalletEntryStatus::Pending => Money::ZERO,
            WalletEntryStatus::Available | WalletEntryStatus::Paid => self.unallocated,
        }
    }
}

/// Everything needed to compute a teacher's balance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    /// All wallet entries of the teacher.
    pub entries: Vec<WalletEntry>,
    /// All allocations against those entries.
    pub allocations: Vec<AllocationState>,
}

impl LedgerSnapshot {
    /// Per-entry positions in entry order.
    #[must_use]
    pub fn positions(&self) -> Vec<EntryPosition> {
        let mut reserved: HashMap<WalletEntryId, Money> = HashMap::new();
        let mut paid: HashMap<WalletEntryId, Money> = HashMap::new();

        for state in &self.allocations {
            let bucket = match state.payout_status {
                PayoutStatus::Pending | PayoutStatus::Approved => &mut reserved,
                PayoutStatus::Paid => &mut paid,
                PayoutStatus::Rejected | PayoutStatus::Failed => continue,
            };
            *bucket.entry(state.allocation.wallet_entry_id).or_default() += state.allocation.amount;
        }

        self.entries
            .iter()
            .map(|entry| {
                let net = entry.net();
                let reserved = reserved.get(&entry.id).copied().unwrap_or_default();
                let paid = paid.get(&entry.id).copied().unwrap_or_default();
                EntryPosition {
                    entry_id: entry.id,
                    status: entry.status,
                    created_at: entry.created_at,
                    net,
                    reserved,
                    paid,
                    unallocated: net - reserved - paid,
                }
            })
            .collect()
    }

    /// Folds the snapshot into balance buckets.
    #[must_use]
    pub fn balance(&self) -> WalletBalance {
        self.positions()
            .iter()
            .fold(WalletBalance::default(), |mut balance, position| {
                balance.total_earnings += position.net;
                match position.status {
                    WalletEntryStatus::Pending => balance.pending_amount += position.net,
                    WalletEntryStatus::Available | WalletEntryStatus::Paid => {
                        balance.reserved_amount += position.reserved;
                        balance.paid_amount += position.paid;
                        balance.available_amount += position.unallocated;
                    }
                }
                balance
            })
    }

    /// Ids of entries that already have a reversal.
    #[must_use]
    pub fn reversed_ids(&self) -> HashSet<WalletEntryId> {
        self.entries.iter().filter_map(|entry| entry.reverses).collect()
    }

    /// Pending earnings whose hold period ended by `now` and that were not
    /// reversed.
    #[must_use]
    pub fn matured(&self, now: DateTime<Utc>) -> Vec<WalletEntryId> {
        let reversed = self.reversed_ids();
        self.entries
            .iter()
            .filter(|entry| {
                entry.kind == WalletEntryKind::Earning
                    && entry.status == WalletEntryStatus::Pending
                    && entry.available_at <= now
                    && !reversed.contains(&entry.id)
            })
            .map(|entry| entry.id)
            .collect()
    }

    /// Available entries completely covered by paid allocations.
    #[must_use]
    pub fn fully_paid(&self) -> Vec<WalletEntryId> {
        self.positions()
            .into_iter()
            .filter(|position| {
                position.status == WalletEntryStatus::Available
                    && !position.net.is_zero()
                    && position.paid == position.net
            })
            .map(|position| position.entry_id)
            .collect()
    }
}

/// Stateless constructors for ledger entries.
pub struct LedgerService;

impl LedgerService {
    /// The earning entry for a completed booking.
    pub fn earning_for(
        booking: &Booking,
        commission: &CommissionSchedule,
        hold_period: Duration,
        now: DateTime<Utc>,
    ) -> Result<WalletEntry, WalletError> {
        let completed_at = match (booking.status, booking.completed_at) {
            (BookingStatus::Completed, Some(completed_at)) => completed_at,
            (status, _) => {
                return Err(WalletError::BookingNotCompleted {
                    booking_id: booking.id,
                    status,
                });
            }
        };

        Ok(WalletEntry {
            id: WalletEntryId::new(),
            teacher_id: booking.teacher_id,
            booking_id: booking.id,
            kind: WalletEntryKind::Earning,
            amount: booking.price,
            commission: commission.commission(booking.price, booking.booking_type)?,
            status: WalletEntryStatus::Pending,
            available_at: completed_at + hold_period,
            created_at: now,
            reverses: None,
        })
    }

    /// The entry offsetting `original`.
    ///
    /// A reversal of a pending earning is itself pending so neither is ever
    /// promoted; otherwise it is available immediately and reduces the
    /// available balance, possibly below zero.
    pub fn reversal_for(
        original: &WalletEntry,
        already_reversed: bool,
        now: DateTime<Utc>,
    ) -> Result<WalletEntry, WalletError> {
        if original.kind != WalletEntryKind::Earning {
            return Err(WalletError::NotReversible(original.id));
        }
        if already_reversed {
            return Err(WalletError::AlreadyReversed(original.id));
        }

        let status = match original.status {
            WalletEntryStatus::Pending => WalletEntryStatus::Pending,
            WalletEntryStatus::Available | WalletEntryStatus::Paid => WalletEntryStatus::Available,
        };

        Ok(WalletEntry {
            id: WalletEntryId::new(),
            teacher_id: original.teacher_id,
            booking_id: original.booking_id,
            kind: WalletEntryKind::Reversal,
            amount: -original.amount,
            commission: -original.commission,
            status,
            available_at: now,
            created_at: now,
            reverses: Some(original.id),
        })
    }
}

//! Wallet domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tutora_shared::types::{BookingId, Money, TeacherId, WalletEntryId};

/// Wallet entry status.
///
/// Entries start `Pending`, become `Available` once the hold period has
/// passed and `Paid` once payouts have fully covered them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletEntryStatus {
    /// Inside the hold period.
    Pending,
    /// Spendable by payouts.
    Available,
    /// Fully paid out.
    Paid,
}

impl WalletEntryStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Available => "available",
            Self::Paid => "paid",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "available" => Some(Self::Available),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }
}

impl fmt::Display for WalletEntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What produced a wallet entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletEntryKind {
    /// Earning from a completed booking.
    Earning,
    /// Offset of an earlier earning.
    Reversal,
}

impl WalletEntryKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Earning => "earning",
            Self::Reversal => "reversal",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "earning" => Some(Self::Earning),
            "reversal" => Some(Self::Reversal),
            _ => None,
        }
    }
}

/// An append-only wallet ledger entry.
///
/// Only `status` ever changes after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEntry {
    /// Entry identifier.
    pub id: WalletEntryId,
    /// Teacher credited.
    pub teacher_id: TeacherId,
    /// Booking the entry derives from.
    pub booking_id: BookingId,
    /// Earning or reversal.
    pub kind: WalletEntryKind,
    /// Gross amount (negative for reversals).
    pub amount: Money,
    /// Platform commission (negative for reversals).
    pub commission: Money,
    /// Current status.
    pub status: WalletEntryStatus,
    /// When the entry leaves the hold period.
    pub available_at: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Entry a reversal offsets.
    pub reverses: Option<WalletEntryId>,
}

impl WalletEntry {
    /// Amount credited to the teacher.
    #[must_use]
    pub fn net(&self) -> Money {
        self.amount - self.commission
    }
}

/// Balance buckets of a teacher's wallet.
///
/// `pending + available + reserved + paid == total` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    /// Net amount still inside the hold period.
    pub pending_amount: Money,
    /// Net amount free to be paid out (may be negative after reversals).
    pub available_amount: Money,
    /// Net amount held by payouts in flight.
    pub reserved_amount: Money,
    /// Net amount already paid out.
    pub paid_amount: Money,
    /// Lifetime net earnings.
    pub total_earnings: Money,
}

impl WalletBalance {
    /// True if the buckets add up to the lifetime total.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.pending_amount + self.available_amount + self.reserved_amount + self.paid_amount
            == self.total_earnings
    }
}

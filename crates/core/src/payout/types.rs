//! Payout domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tutora_shared::types::{Money, PayoutRequestId, TeacherId, WalletEntryId};

/// Payout request status.
///
/// Valid transitions:
/// - Pending → Approved (admin)
/// - Pending → Rejected (admin)
/// - Pending | Approved → Failed (payment rail)
/// - Approved → Paid (payment rail)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    /// Waiting for review.
    Pending,
    /// Approved and submitted to the payment rail.
    Approved,
    /// Money reached the teacher.
    Paid,
    /// Declined by an administrator.
    Rejected,
    /// The payment rail reported a failure.
    Failed,
}

impl PayoutStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Paid => "paid",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "paid" => Some(Self::Paid),
            "rejected" => Some(Self::Rejected),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns true while allocations of this payout hold funds.
    #[must_use]
    pub fn holds_funds(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Rejected | Self::Failed)
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the teacher is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutMethod {
    /// Bank account transfer.
    BankTransfer,
    /// E-wallet top-up.
    EWallet,
}

impl PayoutMethod {
    /// Returns the string representation of the method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BankTransfer => "bank_transfer",
            Self::EWallet => "e_wallet",
        }
    }

    /// Parses a method from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bank_transfer" => Some(Self::BankTransfer),
            "e_wallet" => Some(Self::EWallet),
            _ => None,
        }
    }
}

impl fmt::Display for PayoutMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A teacher's request to withdraw available balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRequest {
    /// Request identifier.
    pub id: PayoutRequestId,
    /// Requesting teacher.
    pub teacher_id: TeacherId,
    /// Requested amount.
    pub amount: Money,
    /// Payment method.
    pub method: PayoutMethod,
    /// Current status.
    pub status: PayoutStatus,
    /// Account number or e-wallet handle.
    pub account_ref: String,
    /// When the request was made.
    pub requested_at: DateTime<Utc>,
    /// Last status change after the request.
    pub processed_at: Option<DateTime<Utc>>,
    /// Rejection or failure reason.
    pub failure_reason: Option<String>,
}

/// Part of a wallet entry assigned to a payout. Immutable.
///
/// Its effect follows the payout status: held while the payout is pending
/// or approved, paid once it is paid, released once rejected or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutAllocation {
    /// Payout the funds are assigned to.
    pub payout_request_id: PayoutRequestId,
    /// Entry the funds come from.
    pub wallet_entry_id: WalletEntryId,
    /// Net amount taken from the entry (negative for absorbed reversals).
    pub amount: Money,
}

/// Validated input for a new payout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutDraft {
    /// Requesting teacher.
    pub teacher_id: TeacherId,
    /// Requested amount.
    pub amount: Money,
    /// Payment method.
    pub method: PayoutMethod,
    /// Account number or e-wallet handle.
    pub account_ref: String,
}

//! Payout request planning and state machine.

use chrono::{DateTime, Utc};
use tutora_shared::types::{Money, PayoutRequestId};

use super::allocation::FifoAllocator;
use super::error::PayoutError;
use super::types::{PayoutAllocation, PayoutDraft, PayoutRequest, PayoutStatus};
use crate::wallet::LedgerSnapshot;

const MAX_ACCOUNT_REF_LEN: usize = 128;

/// A new payout request with the allocations that fund it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPayout {
    /// The request, in `Pending` status.
    pub request: PayoutRequest,
    /// Allocations summing to the request amount.
    pub allocations: Vec<PayoutAllocation>,
}

/// A validated payout status change with its audit data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayoutTransition {
    /// Pending → Approved.
    Approve {
        /// New status.
        new_status: PayoutStatus,
        /// When the request was approved.
        approved_at: DateTime<Utc>,
    },
    /// Pending → Rejected.
    Reject {
        /// New status.
        new_status: PayoutStatus,
        /// Why the request was rejected.
        reason: String,
        /// When the request was rejected.
        rejected_at: DateTime<Utc>,
    },
    /// Approved → Paid.
    MarkPaid {
        /// New status.
        new_status: PayoutStatus,
        /// When the rail confirmed the payment.
        paid_at: DateTime<Utc>,
    },
    /// Pending | Approved → Failed.
    MarkFailed {
        /// New status.
        new_status: PayoutStatus,
        /// Failure reason reported by the rail.
        reason: String,
        /// When the failure was recorded.
        failed_at: DateTime<Utc>,
    },
}

impl PayoutTransition {
    /// Status after the transition.
    #[must_use]
    pub fn new_status(&self) -> PayoutStatus {
        match self {
            Self::Approve { new_status, .. }
            | Self::Reject { new_status, .. }
            | Self::MarkPaid { new_status, .. }
            | Self::MarkFailed { new_status, .. } => *new_status,
        }
    }

    /// Returns `request` with the transition applied.
    #[must_use]
    pub fn apply(&self, request: &PayoutRequest) -> PayoutRequest {
        let mut next = request.clone();
        next.status = self.new_status();
        match self {
            Self::Approve { approved_at, .. } => next.processed_at = Some(*approved_at),
            Self::MarkPaid { paid_at, .. } => next.processed_at = Some(*paid_at),
            Self::Reject {
                reason,
                rejected_at: at,
                ..
            }
            | Self::MarkFailed {
                reason,
                failed_at: at,
                ..
            } => {
                next.processed_at = Some(*at);
                next.failure_reason = Some(reason.clone());
            }
        }
        next
    }
}

/// Stateless service for payout planning and transitions.
pub struct PayoutService;

impl PayoutService {
    /// Checks a draft against the minimum amount and account rules.
    pub fn validate_draft(draft: &PayoutDraft, minimum: Money) -> Result<(), PayoutError> {
        if !draft.amount.is_positive() {
            return Err(PayoutError::Validation(
                "payout amount must be positive".to_string(),
            ));
        }
        if draft.amount < minimum {
            return Err(PayoutError::BelowMinimumPayout {
                amount: draft.amount,
                minimum,
            });
        }

        let account_ref = draft.account_ref.trim();
        if account_ref.is_empty() || account_ref.len() > MAX_ACCOUNT_REF_LEN {
            return Err(PayoutError::Validation(format!(
                "account reference must be 1-{MAX_ACCOUNT_REF_LEN} characters"
            )));
        }
        Ok(())
    }

    /// Validates `draft` against `snapshot` and allocates funds for it.
    ///
    /// Must run while the teacher's ledger is guarded so the snapshot stays
    /// current until the allocations are stored.
    pub fn plan(
        draft: &PayoutDraft,
        snapshot: &LedgerSnapshot,
        minimum: Money,
        now: DateTime<Utc>,
    ) -> Result<PlannedPayout, PayoutError> {
        Self::validate_draft(draft, minimum)?;

        let available = snapshot.balance().available_amount;
        if draft.amount > available {
            return Err(PayoutError::InsufficientBalance {
                requested: draft.amount,
                available,
            });
        }

        let id = PayoutRequestId::new();
        let allocations = FifoAllocator::allocate(&snapshot.positions(), id, draft.amount)?;

        Ok(PlannedPayout {
            request: PayoutRequest {
                id,
                teacher_id: draft.teacher_id,
                amount: draft.amount,
                method: draft.method,
                status: PayoutStatus::Pending,
                account_ref: draft.account_ref.trim().to_string(),
                requested_at: now,
                processed_at: None,
                failure_reason: None,
            },
            allocations,
        })
    }

    /// Approve a pending request.
    pub fn approve(
        current_status: PayoutStatus,
        now: DateTime<Utc>,
    ) -> Result<PayoutTransition, PayoutError> {
        match current_status {
            PayoutStatus::Pending => Ok(PayoutTransition::Approve {
                new_status: PayoutStatus::Approved,
                approved_at: now,
            }),
            _ => Err(PayoutError::InvalidTransition {
                from: current_status,
                to: PayoutStatus::Approved,
            }),
        }
    }

    /// Reject a pending request.
    pub fn reject(
        current_status: PayoutStatus,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<PayoutTransition, PayoutError> {
        let reason = required_reason(reason)?;
        match current_status {
            PayoutStatus::Pending => Ok(PayoutTransition::Reject {
                new_status: PayoutStatus::Rejected,
                reason,
                rejected_at: now,
            }),
            _ => Err(PayoutError::InvalidTransition {
                from: current_status,
                to: PayoutStatus::Rejected,
            }),
        }
    }

    /// Record a successful payment.
    pub fn mark_paid(
        current_status: PayoutStatus,
        now: DateTime<Utc>,
    ) -> Result<PayoutTransition, PayoutError> {
        match current_status {
            PayoutStatus::Approved => Ok(PayoutTransition::MarkPaid {
                new_status: PayoutStatus::Paid,
                paid_at: now,
            }),
            _ => Err(PayoutError::InvalidTransition {
                from: current_status,
                to: PayoutStatus::Paid,
            }),
        }
    }

    /// Record a failed payment.
    pub fn mark_failed(
        current_status: PayoutStatus,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<PayoutTransition, PayoutError> {
        let reason = required_reason(reason)?;
        match current_status {
            PayoutStatus::Pending | PayoutStatus::Approved => Ok(PayoutTransition::MarkFailed {
                new_status: PayoutStatus::Failed,
                reason,
                failed_at: now,
            }),
            _ => Err(PayoutError::InvalidTransition {
                from: current_status,
                to: PayoutStatus::Failed,
            }),
        }
    }

    /// Check if a status transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: PayoutStatus, to: PayoutStatus) -> bool {
        matches!(
            (from, to),
            (
                PayoutStatus::Pending,
                PayoutStatus::Approved | PayoutStatus::Rejected | PayoutStatus::Failed
            ) | (
                PayoutStatus::Approved,
                PayoutStatus::Paid | PayoutStatus::Failed
            )
        )
    }
}

fn required_reason(reason: &str) -> Result<String, PayoutError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(PayoutError::ReasonRequired);
    }
    Ok(reason.to_string())
}

//! FIFO allocation of wallet entries to a payout.

use std::cmp::Ordering;

use tutora_shared::types::{Money, PayoutRequestId};

use super::error::PayoutError;
use super::types::PayoutAllocation;
use crate::wallet::EntryPosition;

/// Assigns spendable entry balances to a payout.
pub struct FifoAllocator;

impl FifoAllocator {
    /// Allocates `amount` from `positions`.
    ///
    /// Negative spendable balances (reversals) are absorbed first, then
    /// positive balances are consumed oldest first, splitting the last entry
    /// when needed.
    pub fn allocate(
        positions: &[EntryPosition],
        payout_request_id: PayoutRequestId,
        amount: Money,
    ) -> Result<Vec<PayoutAllocation>, PayoutError> {
        let available: Money = positions.iter().map(EntryPosition::spendable).sum();
        if amount > available {
            return Err(PayoutError::InsufficientBalance {
                requested: amount,
                available,
            });
        }

        let mut ordered: Vec<&EntryPosition> = positions
            .iter()
            .filter(|position| !position.spendable().is_zero())
            .collect();
        ordered.sort_by(|a, b| fifo_order(a, b));

        let mut allocations = Vec::new();
        let mut covered = Money::ZERO;

        for position in ordered {
            let spendable = position.spendable();
            let take = if spendable.is_negative() {
                spendable
            } else {
                let remaining = amount - covered;
                if !remaining.is_positive() {
                    break;
                }
                spendable.min(remaining)
            };

            covered += take;
            allocations.push(PayoutAllocation {
                payout_request_id,
                wallet_entry_id: position.entry_id,
                amount: take,
            });
        }

        Ok(allocations)
    }
}

/// Negative balances first, then oldest first with the id as tie breaker.
fn fifo_order(a: &EntryPosition, b: &EntryPosition) -> Ordering {
    let a_negative = a.spendable().is_negative();
    let b_negative = b.spendable().is_negative();
    b_negative
        .cmp(&a_negative)
        .then(a.created_at.cmp(&b.created_at))
        .then(a.entry_id.cmp(&b.entry_id))
}

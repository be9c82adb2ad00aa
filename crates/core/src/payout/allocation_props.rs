//! Property-based tests for FIFO payout allocation.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use tutora_shared::types::{BookingId, Money, PayoutRequestId, TeacherId, WalletEntryId};

use crate::payout::allocation::FifoAllocator;
use crate::payout::service::PayoutService;
use crate::payout::types::{PayoutDraft, PayoutMethod, PayoutStatus};
use crate::wallet::{
    AllocationState, LedgerSnapshot, WalletEntry, WalletEntryKind, WalletEntryStatus,
};

/// Available earnings plus a few available reversals, oldest first.
fn arb_snapshot() -> impl Strategy<Value = LedgerSnapshot> {
    prop::collection::vec((1i64..500_000, any::<bool>(), any::<bool>()), 1..12).prop_map(
        |specs| {
            let teacher_id = TeacherId::from_uuid(uuid::Uuid::nil());
            let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
            let mut entries = Vec::new();
            for (index, (amount, reversed, pending)) in specs.into_iter().enumerate() {
                let created_at = base + Duration::hours(i64::try_from(index).unwrap_or(0));
                let earning = WalletEntry {
                    id: WalletEntryId::new(),
                    teacher_id,
                    booking_id: BookingId::new(),
                    kind: WalletEntryKind::Earning,
                    amount: Money::from_minor(amount),
                    commission: Money::from_minor(amount / 10),
                    status: if pending {
                        WalletEntryStatus::Pending
                    } else {
                        WalletEntryStatus::Available
                    },
                    available_at: created_at,
                    created_at,
                    reverses: None,
                };
                if reversed && !pending {
                    entries.push(WalletEntry {
                        id: WalletEntryId::new(),
                        kind: WalletEntryKind::Reversal,
                        amount: -earning.amount,
                        commission: -earning.commission,
                        reverses: Some(earning.id),
                        created_at: created_at + Duration::minutes(30),
                        ..earning.clone()
                    });
                }
                entries.push(earning);
            }
            LedgerSnapshot {
                entries,
                allocations: Vec::new(),
            }
        },
    )
}

fn with_payout(snapshot: &LedgerSnapshot, amount: Money, status: PayoutStatus) -> LedgerSnapshot {
    let positions = snapshot.positions();
    let allocations = FifoAllocator::allocate(&positions, PayoutRequestId::new(), amount)
        .unwrap_or_default();
    let mut next = snapshot.clone();
    next.allocations
        .extend(allocations.into_iter().map(|allocation| AllocationState {
            allocation,
            payout_status: status,
        }));
    next
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Allocations cover exactly the requested amount and never overdraw an entry.
    #[test]
    fn prop_allocation_covers_amount(snapshot in arb_snapshot(), fraction in 1i64..=100) {
        let available = snapshot.balance().available_amount;
        prop_assume!(available.is_positive());
        let amount = Money::from_minor((available.minor() * fraction / 100).max(1));

        let positions = snapshot.positions();
        let allocations = FifoAllocator::allocate(&positions, PayoutRequestId::new(), amount).unwrap();

        let total: Money = allocations.iter().map(|a| a.amount).sum();
        prop_assert_eq!(total, amount);

        let mut partial = 0;
        for allocation in &allocations {
            let position = positions
                .iter()
                .find(|p| p.entry_id == allocation.wallet_entry_id)
                .unwrap();
            prop_assert_eq!(position.status, WalletEntryStatus::Available);
            if position.spendable().is_negative() {
                prop_assert_eq!(allocation.amount, position.spendable());
            } else {
                prop_assert!(allocation.amount.is_positive());
                prop_assert!(allocation.amount <= position.spendable());
                if allocation.amount < position.spendable() {
                    partial += 1;
                }
            }
        }
        prop_assert!(partial <= 1);
    }

    /// A pending payout moves its amount from available to reserved; a failed
    /// one leaves the balance untouched; a paid one moves it to paid.
    #[test]
    fn prop_payout_outcomes_keep_ledger_consistent(snapshot in arb_snapshot(), fraction in 1i64..=100) {
        let before = snapshot.balance();
        prop_assume!(before.available_amount.is_positive());
        let amount = Money::from_minor((before.available_amount.minor() * fraction / 100).max(1));

        let reserved = with_payout(&snapshot, amount, PayoutStatus::Pending).balance();
        prop_assert_eq!(reserved.available_amount, before.available_amount - amount);
        prop_assert_eq!(reserved.reserved_amount, before.reserved_amount + amount);
        prop_assert!(reserved.is_consistent());

        let failed = with_payout(&snapshot, amount, PayoutStatus::Failed).balance();
        prop_assert_eq!(failed, before);

        let paid = with_payout(&snapshot, amount, PayoutStatus::Paid).balance();
        prop_assert_eq!(paid.paid_amount, before.paid_amount + amount);
        prop_assert_eq!(paid.total_earnings, before.total_earnings);
        prop_assert!(paid.is_consistent());
    }

    /// Requests above the available balance are always refused.
    #[test]
    fn prop_overdraw_refused(snapshot in arb_snapshot(), extra in 1i64..1_000_000) {
        let available = snapshot.balance().available_amount;
        let draft = PayoutDraft {
            teacher_id: TeacherId::from_uuid(uuid::Uuid::nil()),
            amount: Money::from_minor(available.minor().max(0) + extra),
            method: PayoutMethod::EWallet,
            account_ref: "0812-3456-7890".to_string(),
        };
        let result = PayoutService::plan(&draft, &snapshot, Money::from_minor(1), Utc::now());
        let is_insufficient = matches!(
            result,
            Err(crate::payout::PayoutError::InsufficientBalance { .. })
        );
        prop_assert!(is_insufficient);
    }
}

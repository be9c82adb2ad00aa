//! Property-based tests for the wallet ledger.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use tutora_shared::types::{BookingId, Money, StudentId, SubjectOfferingId, TeacherId};

use crate::booking::{Booking, BookingStatus, BookingType};
use crate::wallet::commission::CommissionSchedule;
use crate::wallet::ledger::{LedgerService, LedgerSnapshot};
use crate::wallet::types::WalletEntryStatus;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
}

fn arb_booking_type() -> impl Strategy<Value = BookingType> {
    prop_oneof![
        Just(BookingType::Trial),
        Just(BookingType::Single),
        Just(BookingType::Package),
    ]
}

/// Completed bookings with prices and completion offsets in hours.
fn arb_completions() -> impl Strategy<Value = Vec<(i64, i64, BookingType)>> {
    prop::collection::vec((1i64..1_000_000, 0i64..500, arb_booking_type()), 1..15)
}

fn earnings(completions: &[(i64, i64, BookingType)], rate: Decimal) -> LedgerSnapshot {
    let schedule = CommissionSchedule::flat(rate).unwrap();
    let teacher_id = TeacherId::from_uuid(uuid::Uuid::nil());
    let entries = completions
        .iter()
        .map(|(price, offset, booking_type)| {
            let completed_at = base() + Duration::hours(*offset);
            let booking = Booking {
                id: BookingId::new(),
                teacher_id,
                student_id: StudentId::new(),
                subject_offering_id: SubjectOfferingId::new(),
                start_at: completed_at - Duration::hours(1),
                end_at: completed_at,
                status: BookingStatus::Completed,
                booking_type: *booking_type,
                price: Money::from_minor(*price),
                cancellation_reason: None,
                cancelled_by: None,
                created_at: completed_at - Duration::days(1),
                updated_at: completed_at,
                completed_at: Some(completed_at),
            };
            LedgerService::earning_for(&booking, &schedule, Duration::hours(72), completed_at)
                .unwrap()
        })
        .collect();
    LedgerSnapshot {
        entries,
        allocations: Vec::new(),
    }
}

fn promote(snapshot: &mut LedgerSnapshot, now: DateTime<Utc>) -> usize {
    let matured = snapshot.matured(now);
    for entry in &mut snapshot.entries {
        if matured.contains(&entry.id) {
            entry.status = WalletEntryStatus::Available;
        }
    }
    matured.len()
}

fn arb_rate() -> impl Strategy<Value = Decimal> {
    (0i64..=100).prop_map(|percent| Decimal::new(percent, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Commission never exceeds the price and net is never negative for earnings.
    #[test]
    fn prop_net_within_price(completions in arb_completions(), rate in arb_rate()) {
        let snapshot = earnings(&completions, rate);
        for entry in &snapshot.entries {
            prop_assert!(!entry.commission.is_negative());
            prop_assert!(entry.commission <= entry.amount);
            prop_assert!(!entry.net().is_negative());
        }
    }

    /// The sweep promotes exactly the matured entries and a rerun does nothing.
    #[test]
    fn prop_sweep_is_idempotent(completions in arb_completions(), at_hours in 0i64..700) {
        let mut snapshot = earnings(&completions, Decimal::new(15, 2));
        let now = base() + Duration::hours(at_hours);
        let total_before = snapshot.balance().total_earnings;

        promote(&mut snapshot, now);
        for entry in &snapshot.entries {
            let due = entry.available_at <= now;
            prop_assert_eq!(entry.status == WalletEntryStatus::Available, due);
        }

        let after_first = snapshot.clone();
        prop_assert_eq!(promote(&mut snapshot, now), 0);
        prop_assert_eq!(&snapshot, &after_first);

        let balance = snapshot.balance();
        prop_assert_eq!(balance.total_earnings, total_before);
        prop_assert!(balance.is_consistent());
    }

    /// Reversing every earning brings the lifetime total back to zero.
    #[test]
    fn prop_full_reversal_nets_to_zero(completions in arb_completions(), at_hours in 0i64..700) {
        let mut snapshot = earnings(&completions, Decimal::new(15, 2));
        promote(&mut snapshot, base() + Duration::hours(at_hours));

        let now = base() + Duration::hours(800);
        let reversals: Vec<_> = snapshot
            .entries
            .iter()
            .map(|entry| LedgerService::reversal_for(entry, false, now).unwrap())
            .collect();
        snapshot.entries.extend(reversals);

        let balance = snapshot.balance();
        prop_assert_eq!(balance.total_earnings, Money::ZERO);
        prop_assert!(balance.is_consistent());
        prop_assert!(snapshot.matured(now).is_empty());
        prop_assert_eq!(balance.pending_amount, Money::ZERO);
    }
}

//! Property-based tests for BookingService.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use crate::booking::error::BookingError;
use crate::booking::service::BookingService;
use crate::booking::types::{BookingStatus, Party};

fn arb_status() -> impl Strategy<Value = BookingStatus> {
    prop_oneof![
        Just(BookingStatus::Pending),
        Just(BookingStatus::Confirmed),
        Just(BookingStatus::Completed),
        Just(BookingStatus::Cancelled),
    ]
}

fn arb_party() -> impl Strategy<Value = Party> {
    prop_oneof![Just(Party::Student), Just(Party::Teacher), Just(Party::System)]
}

fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..100_000).prop_map(|minutes| {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Confirm succeeds exactly when the transition table allows it.
    #[test]
    fn prop_confirm_matches_transition_table(status in arb_status(), now in arb_instant()) {
        let result = BookingService::confirm(status, now);
        prop_assert_eq!(
            result.is_ok(),
            BookingService::is_valid_transition(status, BookingStatus::Confirmed)
        );
    }

    /// Cancel with a non-blank reason succeeds exactly for active bookings.
    #[test]
    fn prop_cancel_matches_transition_table(
        status in arb_status(),
        party in arb_party(),
        reason in "[a-z]{1,20}",
        now in arb_instant(),
    ) {
        let result = BookingService::cancel(status, &reason, party, now);
        prop_assert_eq!(
            result.is_ok(),
            BookingService::is_valid_transition(status, BookingStatus::Cancelled)
        );
        if let Ok(transition) = result {
            prop_assert_eq!(transition.new_status(), BookingStatus::Cancelled);
        }
    }

    /// Blank reasons are always rejected, whatever the status.
    #[test]
    fn prop_blank_reason_rejected(status in arb_status(), blank in "[ \t]{0,5}", now in arb_instant()) {
        prop_assert_eq!(
            BookingService::cancel(status, &blank, Party::Student, now),
            Err(BookingError::ReasonRequired)
        );
    }

    /// Completion needs a confirmed booking whose end has passed.
    #[test]
    fn prop_complete_requires_end_passed(
        status in arb_status(),
        end_at in arb_instant(),
        now in arb_instant(),
    ) {
        let result = BookingService::complete(status, end_at, now);
        prop_assert_eq!(result.is_ok(), status == BookingStatus::Confirmed && now >= end_at);
    }

    /// Terminal statuses accept no transition at all.
    #[test]
    fn prop_terminal_statuses_are_final(status in arb_status(), to in arb_status()) {
        if status.is_terminal() {
            prop_assert!(!BookingService::is_valid_transition(status, to));
        }
    }
}

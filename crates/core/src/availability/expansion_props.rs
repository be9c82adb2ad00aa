//! Property-based tests for availability expansion.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use proptest::prelude::*;
use tutora_shared::types::{AvailabilityRuleId, TeacherId};

use crate::availability::expansion::expand;
use crate::availability::types::{
    AvailabilityRule, ExceptionKind, ExceptionRule, RecurringRule, TimeWindow,
};
use crate::scheduling::interval::Interval;

fn arb_tz() -> impl Strategy<Value = Tz> {
    prop_oneof![
        Just(chrono_tz::Asia::Jakarta),
        Just(chrono_tz::Europe::Berlin),
        Just(chrono_tz::America::New_York),
        Just(chrono_tz::Australia::Adelaide),
        Just(chrono_tz::UTC),
    ]
}

fn arb_weekday() -> impl Strategy<Value = Weekday> {
    (0u8..7).prop_map(|n| Weekday::try_from(n).unwrap_or(Weekday::Mon))
}

/// Windows on quarter hours between 00:00 and 23:45.
fn arb_window() -> impl Strategy<Value = TimeWindow> {
    (0u32..95, 1u32..=16).prop_map(|(start, len)| {
        let end = (start + len).min(96);
        let to_time = |quarter: u32| {
            if quarter == 96 {
                NaiveTime::MIN
            } else {
                NaiveTime::from_hms_opt(quarter / 4, (quarter % 4) * 15, 0).unwrap()
            }
        };
        TimeWindow::new(to_time(start), to_time(end)).unwrap()
    })
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    // 2026-01-01 plus up to a year, crossing both DST transitions
    (0i64..365).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(offset)
    })
}

fn arb_rule() -> impl Strategy<Value = AvailabilityRule> {
    let teacher_id = TeacherId::from_uuid(uuid::Uuid::nil());
    prop_oneof![
        3 => (arb_weekday(), arb_window(), arb_tz()).prop_map(move |(weekday, window, timezone)| {
            AvailabilityRule::Recurring(RecurringRule {
                id: AvailabilityRuleId::new(),
                teacher_id,
                weekday,
                window,
                timezone,
                valid_from: None,
                valid_until: None,
            })
        }),
        1 => (arb_date(), proptest::option::of(arb_window()), arb_tz()).prop_map(
            move |(date, window, timezone)| {
                AvailabilityRule::Exception(ExceptionRule {
                    id: AvailabilityRuleId::new(),
                    teacher_id,
                    date,
                    timezone,
                    kind: window.map_or(ExceptionKind::Blocked, ExceptionKind::Replaced),
                })
            }
        ),
    ]
}

fn arb_query_window() -> impl Strategy<Value = Interval> {
    (0i64..360 * 24, 1i64..=14 * 24).prop_map(|(offset_hours, len_hours)| {
        let base: DateTime<Utc> = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let start = base + Duration::hours(offset_hours);
        Interval::new(start, start + Duration::hours(len_hours)).unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Output is sorted, disjoint, non-touching and inside the query window.
    #[test]
    fn prop_expansion_is_normalized_and_clipped(
        rules in prop::collection::vec(arb_rule(), 0..8),
        window in arb_query_window(),
    ) {
        let intervals = expand(&rules, &window);

        for interval in &intervals {
            prop_assert!(window.contains(interval));
        }
        for pair in intervals.windows(2) {
            prop_assert!(pair[0].end() < pair[1].start());
        }
    }

    /// Rule order does not affect the result.
    #[test]
    fn prop_expansion_ignores_rule_order(
        rules in prop::collection::vec(arb_rule(), 0..8),
        window in arb_query_window(),
    ) {
        let mut reversed = rules.clone();
        reversed.reverse();
        prop_assert_eq!(expand(&rules, &window), expand(&reversed, &window));
    }

    /// A blocked exception removes every interval a rule would have on that date.
    #[test]
    fn prop_blocked_date_has_no_availability(
        weekday in arb_weekday(),
        window in arb_window(),
        week in 0i64..50,
    ) {
        let tz = chrono_tz::Asia::Jakarta;
        let teacher_id = TeacherId::new();
        let monday = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap() + Duration::weeks(week);
        let date = monday + Duration::days(i64::from(weekday.num_days_from_monday()));

        let rules = vec![
            AvailabilityRule::Recurring(RecurringRule {
                id: AvailabilityRuleId::new(),
                teacher_id,
                weekday,
                window,
                timezone: tz,
                valid_from: None,
                valid_until: None,
            }),
            AvailabilityRule::Exception(ExceptionRule {
                id: AvailabilityRuleId::new(),
                teacher_id,
                date,
                timezone: tz,
                kind: ExceptionKind::Blocked,
            }),
        ];
        let day = crate::availability::local_days(date, date, tz).unwrap();

        prop_assert!(expand(&rules, &day).is_empty());
    }
}

//! Property-based tests for slot generation.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use proptest::prelude::*;
use tutora_shared::types::{AvailabilityRuleId, Money, TeacherId};

use crate::availability::{AvailabilityRule, RecurringRule, TimeWindow, expand};
use crate::scheduling::interval::Interval;
use crate::scheduling::slots::{SlotGenerator, SlotQuery};

const TZ: chrono_tz::Tz = chrono_tz::Europe::Berlin;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 23, 0, 0, 0).unwrap()
}

fn arb_rules(teacher_id: TeacherId) -> impl Strategy<Value = Vec<AvailabilityRule>> {
    prop::collection::vec((0u8..7, 0u32..80, 1u32..=16), 1..6).prop_map(move |specs| {
        specs
            .into_iter()
            .map(|(day, start, len)| {
                let to_time = |quarter: u32| {
                    NaiveTime::from_hms_opt(quarter / 4, (quarter % 4) * 15, 0).unwrap()
                };
                AvailabilityRule::Recurring(RecurringRule {
                    id: AvailabilityRuleId::new(),
                    teacher_id,
                    weekday: Weekday::try_from(day).unwrap_or(Weekday::Mon),
                    window: TimeWindow::new(to_time(start), to_time(start + len)).unwrap(),
                    timezone: TZ,
                    valid_from: None,
                    valid_until: None,
                })
            })
            .collect()
    })
}

/// Busy intervals on quarter hours within two weeks of `base()`.
fn arb_busy() -> impl Strategy<Value = Vec<Interval>> {
    prop::collection::vec((0i64..14 * 96, 1i64..=8), 0..12).prop_map(|specs| {
        specs
            .into_iter()
            .filter_map(|(start, len)| {
                let start = base() + Duration::minutes(start * 15);
                Interval::new(start, start + Duration::minutes(len * 15))
            })
            .collect()
    })
}

fn arb_duration() -> impl Strategy<Value = u32> {
    prop_oneof![Just(30u32), Just(45), Just(60), Just(90)]
}

fn query(teacher_id: TeacherId, duration_minutes: u32) -> SlotQuery {
    let from = NaiveDate::from_ymd_opt(2026, 3, 23).unwrap();
    SlotQuery {
        teacher_id,
        from,
        to: from + Duration::days(13),
        duration_minutes,
        timezone: TZ,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Slots never overlap busy time, always lie in availability and respect the lead time.
    #[test]
    fn prop_slots_respect_busy_and_availability(
        rules in arb_rules(TeacherId::from_uuid(uuid::Uuid::nil())),
        busy in arb_busy(),
        duration in arb_duration(),
        now_offset in 0i64..7 * 24,
    ) {
        let teacher_id = TeacherId::from_uuid(uuid::Uuid::nil());
        let now = base() - Duration::days(1) + Duration::hours(now_offset);
        let generator = SlotGenerator::default();
        let query = query(teacher_id, duration);

        let schedule = generator
            .generate(&query, &rules, &busy, &[30, 45, 60, 90], Money::from_minor(60_000), now)
            .unwrap();
        let window = generator.validate_query(&query, &[duration]).unwrap();
        let available = expand(&rules, &window);

        let mut previous: Option<DateTime<Utc>> = None;
        for slot in &schedule {
            let interval = Interval::new(slot.start_at, slot.end_at).unwrap();

            prop_assert_eq!(interval.duration(), Duration::minutes(i64::from(duration)));
            prop_assert!(slot.start_at > generator.not_before(now));
            prop_assert!(busy.iter().all(|b| !b.overlaps(&interval)));
            prop_assert!(available.iter().any(|a| a.contains(&interval)));
            if let Some(previous) = previous {
                prop_assert!(previous < slot.start_at);
            }
            previous = Some(slot.start_at);
        }
    }

    /// The same inputs always produce the same slots.
    #[test]
    fn prop_slot_lookup_is_idempotent(
        rules in arb_rules(TeacherId::from_uuid(uuid::Uuid::nil())),
        busy in arb_busy(),
        duration in arb_duration(),
    ) {
        let teacher_id = TeacherId::from_uuid(uuid::Uuid::nil());
        let generator = SlotGenerator::default();
        let query = query(teacher_id, duration);
        let now = base() - Duration::days(1);
        let allowed = [30, 45, 60, 90];
        let price = Money::from_minor(60_000);

        let first = generator.generate(&query, &rules, &busy, &allowed, price, now).unwrap();
        let second = generator.generate(&query, &rules, &busy, &allowed, price, now).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.iter().collect::<Vec<_>>(), second.iter().collect::<Vec<_>>());
        prop_assert_eq!(first.iter().count(), first.iter().count());
    }
}

//! Expansion of availability rules into concrete UTC intervals.
//!
//! Local wall-clock windows are resolved against the rule's timezone:
//! - a time that falls into a DST gap moves forward to the first valid
//!   quarter hour;
//! - an ambiguous time resolves to its earliest instant for a window start
//!   and its latest instant for a window end.
//!
//! An exception owns its local date: any exception on a date suppresses all
//! recurring windows of that date. Several exceptions on one date combine,
//! with `Blocked` winning over `Replaced`.

use std::collections::HashMap;

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;

use super::types::{AvailabilityRule, ExceptionKind, ExceptionRule, RecurringRule, TimeWindow};
use crate::scheduling::interval::{Interval, normalize};

const GAP_STEP_MINUTES: i64 = 15;
const MAX_GAP_STEPS: i64 = 12;

#[derive(Debug, Clone, Copy)]
enum Edge {
    Start,
    End,
}

/// Expands `rules` into the normalized free intervals inside `window`.
#[must_use]
pub fn expand(rules: &[AvailabilityRule], window: &Interval) -> Vec<Interval> {
    let mut recurring: Vec<&RecurringRule> = Vec::new();
    let mut exceptions: HashMap<NaiveDate, Vec<&ExceptionRule>> = HashMap::new();

    for rule in rules {
        match rule {
            AvailabilityRule::Recurring(rule) => recurring.push(rule),
            AvailabilityRule::Exception(rule) => {
                exceptions.entry(rule.date).or_default().push(rule);
            }
        }
    }

    let mut intervals = Vec::new();

    for rule in recurring {
        for date in local_dates(window, rule.timezone) {
            if exceptions.contains_key(&date) || !rule.applies_on(date) {
                continue;
            }
            intervals.extend(localize(&rule.window, date, rule.timezone));
        }
    }

    for (date, day) in &exceptions {
        if day.iter().any(|e| e.kind == ExceptionKind::Blocked) {
            continue;
        }
        for exception in day {
            if let ExceptionKind::Replaced(replacement) = &exception.kind {
                intervals.extend(localize(replacement, *date, exception.timezone));
            }
        }
    }

    normalize(
        intervals
            .into_iter()
            .filter_map(|interval| interval.intersect(window))
            .collect(),
    )
}

/// The UTC interval covering local dates `from..=to` in `tz`.
///
/// Runs from `from` 00:00 to the midnight after `to`, both resolved like a
/// window start.
#[must_use]
pub fn local_days(from: NaiveDate, to: NaiveDate, tz: Tz) -> Option<Interval> {
    let start = resolve(tz, from.and_time(NaiveTime::MIN), Edge::Start)?;
    let end = resolve(tz, to.succ_opt()?.and_time(NaiveTime::MIN), Edge::Start)?;
    Interval::new(start, end)
}

/// Local dates in `tz` whose windows can reach into `window`.
///
/// A window starting on the previous local date may run past midnight, so the
/// scan begins one day early.
fn local_dates(window: &Interval, tz: Tz) -> impl Iterator<Item = NaiveDate> {
    let first = window.start().with_timezone(&tz).date_naive();
    let first = first.pred_opt().unwrap_or(first);
    let last = window.end().with_timezone(&tz).date_naive();
    first.iter_days().take_while(move |date| *date <= last)
}

fn localize(window: &TimeWindow, date: NaiveDate, tz: Tz) -> Option<Interval> {
    let start = resolve(tz, window.local_start(date), Edge::Start)?;
    let end = resolve(tz, window.local_end(date)?, Edge::End)?;
    Interval::new(start, end)
}

fn resolve(tz: Tz, local: NaiveDateTime, edge: Edge) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(instant) => Some(instant.with_timezone(&Utc)),
        LocalResult::Ambiguous(first, second) => {
            let (earliest, latest) = if first <= second {
                (first, second)
            } else {
                (second, first)
            };
            let chosen = match edge {
                Edge::Start => earliest,
                Edge::End => latest,
            };
            Some(chosen.with_timezone(&Utc))
        }
        LocalResult::None => (1..=MAX_GAP_STEPS).find_map(|step| {
            let shifted = local.checked_add_signed(Duration::minutes(GAP_STEP_MINUTES * step))?;
            tz.from_local_datetime(&shifted)
                .earliest()
                .map(|instant| instant.with_timezone(&Utc))
        }),
    }
}

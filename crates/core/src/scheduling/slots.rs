//! Bookable slot generation.
//!
//! `SlotGenerator` is pure: it takes rules, busy intervals, the lesson price
//! and `now`, and returns a `SlotSchedule` that can be iterated any number of
//! times with identical results.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tutora_shared::config::SchedulingConfig;
use tutora_shared::types::{Money, TeacherId};

use super::error::SchedulingError;
use super::interval::{Interval, subtract};
use crate::availability::{AvailabilityRule, expand, local_days};

/// Limits applied to slot queries and bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPolicy {
    /// Maximum number of local days one query may cover.
    pub max_range_days: u32,
    /// Step between candidate starts, in minutes.
    pub granularity_minutes: u32,
    /// Lessons must start strictly later than `now` plus this many minutes.
    pub min_lead_time_minutes: u32,
}

impl From<&SchedulingConfig> for SlotPolicy {
    fn from(config: &SchedulingConfig) -> Self {
        Self {
            max_range_days: config.max_range_days,
            granularity_minutes: config.slot_granularity_minutes.max(1),
            min_lead_time_minutes: config.min_lead_time_minutes,
        }
    }
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self::from(&SchedulingConfig::default())
    }
}

/// A request for bookable slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotQuery {
    /// Teacher whose calendar is queried.
    pub teacher_id: TeacherId,
    /// First local date (inclusive).
    pub from: NaiveDate,
    /// Last local date (inclusive).
    pub to: NaiveDate,
    /// Lesson length in minutes.
    pub duration_minutes: u32,
    /// Timezone the dates are expressed in.
    pub timezone: Tz,
}

/// A bookable lesson slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSlot {
    /// Lesson start.
    pub start_at: DateTime<Utc>,
    /// Lesson end.
    pub end_at: DateTime<Utc>,
    /// Price of the lesson.
    pub price: Money,
    /// Lesson length in minutes.
    pub duration_minutes: u32,
    /// Always true for generated slots.
    pub available: bool,
}

/// Stateless slot generator configured with a `SlotPolicy`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotGenerator {
    policy: SlotPolicy,
}

impl SlotGenerator {
    /// Creates a generator.
    #[must_use]
    pub const fn new(policy: SlotPolicy) -> Self {
        Self { policy }
    }

    /// The active policy.
    #[must_use]
    pub const fn policy(&self) -> &SlotPolicy {
        &self.policy
    }

    /// Lessons must start strictly after this instant.
    #[must_use]
    pub fn not_before(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::minutes(i64::from(self.policy.min_lead_time_minutes))
    }

    /// Validates a query and returns the UTC window it covers.
    pub fn validate_query(
        &self,
        query: &SlotQuery,
        allowed_durations: &[u32],
    ) -> Result<Interval, SchedulingError> {
        ensure_allowed(query.duration_minutes, allowed_durations)?;

        if query.from > query.to {
            return Err(SchedulingError::InvertedRange {
                from: query.from,
                to: query.to,
            });
        }

        let days = (query.to - query.from).num_days() + 1;
        if days > i64::from(self.policy.max_range_days) {
            return Err(SchedulingError::RangeTooLarge {
                days,
                max: self.policy.max_range_days,
            });
        }

        local_days(query.from, query.to, query.timezone).ok_or(SchedulingError::EmptyInterval)
    }

    /// Builds the slot schedule for `query`.
    ///
    /// `busy` holds the intervals of the teacher's PENDING and CONFIRMED
    /// bookings; `price` is the price of one lesson of the queried length.
    pub fn generate(
        &self,
        query: &SlotQuery,
        rules: &[AvailabilityRule],
        busy: &[Interval],
        allowed_durations: &[u32],
        price: Money,
        now: DateTime<Utc>,
    ) -> Result<SlotSchedule, SchedulingError> {
        let window = self.validate_query(query, allowed_durations)?;
        let free = subtract(expand(rules, &window), busy.to_vec());

        Ok(SlotSchedule {
            free,
            length: Duration::minutes(i64::from(query.duration_minutes)),
            step: Duration::minutes(i64::from(self.policy.granularity_minutes.max(1))),
            not_before: self.not_before(now),
            price,
            duration_minutes: query.duration_minutes,
        })
    }

    /// Re-validates a concrete lesson interval at commit time.
    ///
    /// Checks the length, the lead time and that the interval lies inside the
    /// expanded availability. Overlap with other bookings is checked by the
    /// booking store.
    pub fn check_candidate(
        &self,
        rules: &[AvailabilityRule],
        candidate: &Interval,
        allowed_durations: &[u32],
        now: DateTime<Utc>,
    ) -> Result<(), SchedulingError> {
        let minutes = u32::try_from(candidate.duration().num_minutes()).unwrap_or(u32::MAX);
        if candidate.duration() != Duration::minutes(i64::from(minutes)) {
            return Err(SchedulingError::DurationNotAllowed {
                duration: minutes,
                allowed: allowed_durations.to_vec(),
            });
        }
        ensure_allowed(minutes, allowed_durations)?;

        let not_before = self.not_before(now);
        if candidate.start() <= not_before {
            return Err(SchedulingError::TooSoon {
                earliest: not_before,
            });
        }

        if expand(rules, candidate) != [*candidate] {
            return Err(SchedulingError::OutsideAvailability);
        }

        Ok(())
    }
}

fn ensure_allowed(duration: u32, allowed: &[u32]) -> Result<(), SchedulingError> {
    if duration == 0 || !allowed.contains(&duration) {
        return Err(SchedulingError::DurationNotAllowed {
            duration,
            allowed: allowed.to_vec(),
        });
    }
    Ok(())
}

/// The result of a slot query: free intervals plus the stepping rules.
///
/// Iterate with [`SlotSchedule::iter`]; every iteration yields the same
/// ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSchedule {
    free: Vec<Interval>,
    length: Duration,
    step: Duration,
    not_before: DateTime<Utc>,
    price: Money,
    duration_minutes: u32,
}

impl SlotSchedule {
    /// Iterates over the slots in chronological order.
    #[must_use]
    pub fn iter(&self) -> SlotIter<'_> {
        SlotIter {
            schedule: self,
            index: 0,
            cursor: None,
        }
    }

    /// Free intervals the slots are cut from.
    #[must_use]
    pub fn free_intervals(&self) -> &[Interval] {
        &self.free
    }
}

impl<'a> IntoIterator for &'a SlotSchedule {
    type Item = TimeSlot;
    type IntoIter = SlotIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over a `SlotSchedule`.
#[derive(Debug, Clone)]
pub struct SlotIter<'a> {
    schedule: &'a SlotSchedule,
    index: usize,
    cursor: Option<DateTime<Utc>>,
}

impl Iterator for SlotIter<'_> {
    type Item = TimeSlot;

    fn next(&mut self) -> Option<Self::Item> {
        let schedule = self.schedule;
        loop {
            let interval = schedule.free.get(self.index)?;
            let start = self.cursor.unwrap_or_else(|| interval.start());
            let end = start + schedule.length;

            if end > interval.end() {
                self.index += 1;
                self.cursor = None;
                continue;
            }

            if start <= schedule.not_before {
                // jump straight to the first step past the lead time
                let behind = (schedule.not_before - start).num_seconds();
                let step = schedule.step.num_seconds().max(1);
                self.cursor = Some(start + Duration::seconds((behind / step + 1) * step));
                continue;
            }

            self.cursor = Some(start + schedule.step);
            return Some(TimeSlot {
                start_at: start,
                end_at: end,
                price: schedule.price,
                duration_minutes: schedule.duration_minutes,
                available: true,
            });
        }
    }
}

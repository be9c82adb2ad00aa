//! Half-open UTC intervals and the set operations slot generation needs.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A non-empty half-open interval `[start, end)` of UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Interval {
    /// Creates an interval, or `None` when `end <= start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Inclusive start.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive end.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Length of the interval.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// True if the two intervals share at least one instant.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// True if `other` lies entirely inside `self`.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The common part of both intervals, if any.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        Self::new(self.start.max(other.start), self.end.min(other.end))
    }
}

/// Sorts intervals and merges the ones that overlap or touch.
#[must_use]
pub fn normalize(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_unstable();

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if interval.start <= last.end => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval),
        }
    }
    merged
}

/// Removes every `busy` instant from `free`.
///
/// Both inputs may be unsorted and overlapping; the result is normalized.
#[must_use]
pub fn subtract(free: Vec<Interval>, busy: Vec<Interval>) -> Vec<Interval> {
    let busy = normalize(busy);
    let mut result = Vec::new();

    for interval in normalize(free) {
        let mut cursor = interval.start;

        // busy is sorted by start, so blocks left of the cursor can be skipped
        let first = busy.partition_point(|b| b.end <= cursor);
        for block in &busy[first..] {
            if block.start >= interval.end {
                break;
            }
            if block.start > cursor {
                result.push(Interval {
                    start: cursor,
                    end: block.start,
                });
            }
            cursor = cursor.max(block.end);
            if cursor >= interval.end {
                break;
            }
        }

        if cursor < interval.end {
            result.push(Interval {
                start: cursor,
                end: interval.end,
            });
        }
    }

    result
}

//! Availability rule types.
//!
//! A teacher publishes weekly recurring windows and date-specific exceptions
//! that block or replace the recurring windows for one local date. Times are
//! wall-clock times in the rule's IANA timezone.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tutora_shared::types::{AvailabilityRuleId, TeacherId};

use crate::scheduling::SchedulingError;

/// A wall-clock window within one day.
///
/// An `end` of `00:00` means midnight at the end of the day, so `00:00-00:00`
/// covers a whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeWindow")]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

#[derive(Deserialize)]
struct RawTimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = SchedulingError;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeWindow {
    /// Creates a window, rejecting empty or inverted ones.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, SchedulingError> {
        if start < end || end == NaiveTime::MIN {
            Ok(Self { start, end })
        } else {
            Err(SchedulingError::InvalidWindow { start, end })
        }
    }

    /// Window start (inclusive).
    #[must_use]
    pub const fn start(&self) -> NaiveTime {
        self.start
    }

    /// Window end (exclusive).
    #[must_use]
    pub const fn end(&self) -> NaiveTime {
        self.end
    }

    /// Local start on `date`.
    #[must_use]
    pub fn local_start(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.start)
    }

    /// Local end on `date`, rolling over to the next day for a midnight end.
    #[must_use]
    pub fn local_end(&self, date: NaiveDate) -> Option<NaiveDateTime> {
        if self.end == NaiveTime::MIN {
            date.succ_opt().map(|next| next.and_time(NaiveTime::MIN))
        } else {
            Some(date.and_time(self.end))
        }
    }
}

/// A weekly window that repeats on one weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringRule {
    /// Rule identifier.
    pub id: AvailabilityRuleId,
    /// Owning teacher.
    pub teacher_id: TeacherId,
    /// Day of the week the window repeats on.
    pub weekday: Weekday,
    /// Wall-clock window.
    pub window: TimeWindow,
    /// Timezone the window is expressed in.
    pub timezone: Tz,
    /// First local date the rule applies to.
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,
    /// Last local date the rule applies to.
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
}

impl RecurringRule {
    /// True if the rule produces a window on `date`.
    #[must_use]
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        date.weekday() == self.weekday
            && self.valid_from.is_none_or(|from| from <= date)
            && self.valid_until.is_none_or(|until| date <= until)
    }
}

/// What an exception does to its date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "window", rename_all = "snake_case")]
pub enum ExceptionKind {
    /// No availability at all on the date.
    Blocked,
    /// The recurring windows are replaced by this window.
    Replaced(TimeWindow),
}

/// A one-off override for a single local date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionRule {
    /// Rule identifier.
    pub id: AvailabilityRuleId,
    /// Owning teacher.
    pub teacher_id: TeacherId,
    /// Local date the exception applies to.
    pub date: NaiveDate,
    /// Timezone of the replacement window.
    pub timezone: Tz,
    /// Block or replace.
    #[serde(rename = "override")]
    pub kind: ExceptionKind,
}

/// A teacher availability rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AvailabilityRule {
    /// Weekly recurring window.
    Recurring(RecurringRule),
    /// Date-specific override.
    Exception(ExceptionRule),
}

impl AvailabilityRule {
    /// Rule identifier.
    #[must_use]
    pub fn id(&self) -> AvailabilityRuleId {
        match self {
            Self::Recurring(rule) => rule.id,
            Self::Exception(rule) => rule.id,
        }
    }

    /// Owning teacher.
    #[must_use]
    pub fn teacher_id(&self) -> TeacherId {
        match self {
            Self::Recurring(rule) => rule.teacher_id,
            Self::Exception(rule) => rule.teacher_id,
        }
    }

    /// Timezone the rule's times are expressed in.
    #[must_use]
    pub fn timezone(&self) -> Tz {
        match self {
            Self::Recurring(rule) => rule.timezone,
            Self::Exception(rule) => rule.timezone,
        }
    }

    /// Returns the same rule under a different identity.
    #[must_use]
    pub fn with_identity(mut self, id: AvailabilityRuleId, teacher_id: TeacherId) -> Self {
        match &mut self {
            Self::Recurring(rule) => {
                rule.id = id;
                rule.teacher_id = teacher_id;
            }
            Self::Exception(rule) => {
                rule.id = id;
                rule.teacher_id = teacher_id;
            }
        }
        self
    }

    /// Checks invariants not enforced by construction.
    pub fn validate(&self) -> Result<(), SchedulingError> {
        if let Self::Recurring(RecurringRule {
            valid_from: Some(from),
            valid_until: Some(until),
            ..
        }) = self
        {
            if from > until {
                return Err(SchedulingError::InvalidValidity {
                    from: *from,
                    until: *until,
                });
            }
        }
        Ok(())
    }
}

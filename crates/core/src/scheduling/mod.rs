//! Slot scheduling primitives.
//!
//! # Modules
//!
//! - `interval` - Half-open UTC intervals, merge and subtraction
//! - `slots` - Slot generation over free intervals
//! - `error` - Scheduling errors

pub mod error;
pub mod interval;
pub mod slots;

#[cfg(test)]
mod slots_props;

pub use error::SchedulingError;
pub use interval::{Interval, normalize, subtract};
pub use slots::{SlotGenerator, SlotIter, SlotPolicy, SlotQuery, SlotSchedule, TimeSlot};

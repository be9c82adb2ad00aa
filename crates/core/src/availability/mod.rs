//! Teacher availability: recurring weekly windows and date exceptions.
//!
//! # Modules
//!
//! - `types` - Rule types (`AvailabilityRule`, `TimeWindow`, ...)
//! - `expansion` - Timezone-aware expansion into UTC intervals
//! - `error` - Availability management errors

pub mod error;
pub mod expansion;
pub mod types;

#[cfg(test)]
mod expansion_props;

pub use error::AvailabilityError;
pub use expansion::{expand, local_days};
pub use types::{AvailabilityRule, ExceptionKind, ExceptionRule, RecurringRule, TimeWindow};

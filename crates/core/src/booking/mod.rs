//! Booking lifecycle and conflict detection.
//!
//! # Modules
//!
//! - `types` - Booking domain types (`Booking`, `BookingStatus`, ...)
//! - `service` - Status transitions
//! - `conflict` - Overlap check used inside the per-teacher guard
//! - `pricing` - Lesson price snapshots
//! - `error` - Booking errors

pub mod conflict;
pub mod error;
pub mod pricing;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use conflict::ConflictResolver;
pub use error::BookingError;
pub use pricing::LessonPricing;
pub use service::{BookingService, BookingTransition, EXPIRED_REASON};
pub use types::{Booking, BookingStatus, BookingType, Party};

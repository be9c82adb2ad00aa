//! Wallet error types.

use rust_decimal::Decimal;
use thiserror::Error;
use tutora_shared::types::{BookingId, WalletEntryId};

use crate::booking::BookingStatus;
use crate::repository::StoreError;

/// Errors that can occur during wallet operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    // ========== Configuration Errors ==========
    /// Commission rates must lie in `[0, 1]`.
    #[error("Commission rate {0} is outside [0, 1]")]
    InvalidCommissionRate(Decimal),

    // ========== Validation Errors ==========
    /// Malformed input or arithmetic overflow.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Earnings are only recorded for completed bookings.
    #[error("Booking {booking_id} is {status}, not completed")]
    BookingNotCompleted {
        /// Booking.
        booking_id: BookingId,
        /// Its current status.
        status: BookingStatus,
    },

    // ========== State Errors ==========
    /// The entry already has a reversal.
    #[error("Wallet entry {0} is already reversed")]
    AlreadyReversed(WalletEntryId),

    /// Only earnings can be reversed.
    #[error("Wallet entry {0} cannot be reversed")]
    NotReversible(WalletEntryId),

    // ========== Lookup Errors ==========
    /// No earning exists for the booking.
    #[error("No earning recorded for booking {0}")]
    EarningNotFound(BookingId),

    /// Booking not found.
    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    // ========== Concurrency Errors ==========
    /// Another operation holds the teacher's ledger.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WalletError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCommissionRate(_) => "INVALID_COMMISSION_RATE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BookingNotCompleted { .. } => "BOOKING_NOT_COMPLETED",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::NotReversible(_) => "NOT_REVERSIBLE",
            Self::EarningNotFound(_) => "EARNING_NOT_FOUND",
            Self::BookingNotFound(_) => "BOOKING_NOT_FOUND",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::EarningNotFound(_) | Self::BookingNotFound(_) => 404,
            Self::BookingNotCompleted { .. }
            | Self::AlreadyReversed(_)
            | Self::NotReversible(_)
            | Self::ConcurrentModification => 409,
            Self::InvalidCommissionRate(_) | Self::Database(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}

impl From<StoreError> for WalletError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Busy(_) => Self::ConcurrentModification,
            StoreError::Database(message) => Self::Database(message),
        }
    }
}

//! Payout error types.

use thiserror::Error;
use tutora_shared::types::{Money, PayoutRequestId};

use super::types::PayoutStatus;
use crate::repository::StoreError;

/// Errors that can occur while requesting or processing payouts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayoutError {
    // ========== Balance Errors ==========
    /// The requested amount is below the configured minimum.
    #[error("Payout of {amount} is below the minimum of {minimum}")]
    BelowMinimumPayout {
        /// Requested amount.
        amount: Money,
        /// Configured minimum.
        minimum: Money,
    },

    /// The available balance does not cover the request.
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Requested amount.
        requested: Money,
        /// Available balance at request time.
        available: Money,
    },

    // ========== Validation Errors ==========
    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rejections and failures require a reason.
    #[error("A reason is required")]
    ReasonRequired,

    // ========== State Errors ==========
    /// The transition is not allowed from the current status.
    #[error("Invalid payout transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: PayoutStatus,
        /// Requested status.
        to: PayoutStatus,
    },

    /// Payout request not found.
    #[error("Payout request not found: {0}")]
    NotFound(PayoutRequestId),

    // ========== Concurrency Errors ==========
    /// Another operation holds the teacher's ledger.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl PayoutError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BelowMinimumPayout { .. } => "BELOW_MINIMUM_PAYOUT",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ReasonRequired => "REASON_REQUIRED",
            Self::InvalidTransition { .. } => "INVALID_STATE_TRANSITION",
            Self::NotFound(_) => "PAYOUT_NOT_FOUND",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::Validation(_) | Self::ReasonRequired => 400,

            // 404 Not Found
            Self::NotFound(_) => 404,

            // 409 Conflict
            Self::InvalidTransition { .. } | Self::ConcurrentModification => 409,

            // 422 Unprocessable - balance rules
            Self::BelowMinimumPayout { .. } | Self::InsufficientBalance { .. } => 422,

            // 500 Internal Server Error
            Self::Database(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}

impl From<StoreError> for PayoutError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Busy(_) => Self::ConcurrentModification,
            StoreError::Database(message) => Self::Database(message),
        }
    }
}

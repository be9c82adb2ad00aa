//! Errors shared by every store implementation.

use thiserror::Error;
use tutora_shared::types::TeacherId;

/// Failure of a store operation that is not a domain rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The teacher's guard is held by another operation.
    #[error("Teacher {0} is busy, retry later")]
    Busy(TeacherId),

    /// Underlying storage failed.
    #[error("Database error: {0}")]
    Database(String),
}

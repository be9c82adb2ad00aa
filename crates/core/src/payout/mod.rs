//! Payout requests funded by the wallet ledger.
//!
//! # Modules
//!
//! - `types` - Request, allocation and status types
//! - `allocation` - FIFO allocation of entry balances
//! - `service` - Planning and status transitions
//! - `error` - Payout errors

pub mod allocation;
pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod allocation_props;

pub use allocation::FifoAllocator;
pub use error::PayoutError;
pub use service::{PayoutService, PayoutTransition, PlannedPayout};
pub use types::{PayoutAllocation, PayoutDraft, PayoutMethod, PayoutRequest, PayoutStatus};

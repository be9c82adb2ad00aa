//! Teacher wallet ledger.
//!
//! # Modules
//!
//! - `types` - Entry and balance types
//! - `commission` - Commission rates per booking type
//! - `ledger` - Entry construction, maturation and balance folding
//! - `error` - Wallet errors

pub mod commission;
pub mod error;
pub mod ledger;
pub mod types;

#[cfg(test)]
mod ledger_props;

pub use commission::CommissionSchedule;
pub use error::WalletError;
pub use ledger::{AllocationState, EntryPosition, LedgerService, LedgerSnapshot};
pub use types::{WalletBalance, WalletEntry, WalletEntryKind, WalletEntryStatus};

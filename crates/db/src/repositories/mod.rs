//! PostgreSQL implementations of the core repository traits.
//!
//! Every mutating method runs in one database transaction. Methods that
//! must see a stable view of a teacher's calendar or ledger first take the
//! teacher's advisory lock (see [`guard`]).

mod availability;
mod booking;
mod catalog;
pub(crate) mod convert;
pub(crate) mod guard;
mod payout;
mod wallet;

use sea_orm::DatabaseConnection;

/// Store backed by PostgreSQL through `SeaORM`.
#[derive(Debug, Clone)]
pub struct PgStore {
    db: DatabaseConnection,
}

impl PgStore {
    /// Creates a store over an open connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

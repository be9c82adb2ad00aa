//! Database migration runner for Tutora.
//!
//! Reads the connection string from `DATABASE_URL` (or `-u`).
//!
//! Usage:
//!   migrator up      - Create the scheduling and ledger schema
//!   migrator down    - Drop it again
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop everything and re-run migrations

use sea_orm_migration::prelude::*;
use tutora_db::migration::Migrator;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    cli::run_cli(Migrator).await;
}

//! Per-teacher transaction guard.
//!
//! Teacher-scoped mutations take a transaction-level advisory lock keyed by
//! the teacher id. The lock is tried, never waited for, and released when
//! the transaction ends.

use sea_orm::{ConnectionTrait, DatabaseTransaction, DbBackend, Statement};
use tutora_core::repository::StoreError;
use tutora_shared::types::TeacherId;

use super::convert::db_err;

const TRY_LOCK_SQL: &str = "SELECT pg_try_advisory_xact_lock(hashtextextended($1, 0)) AS locked";

/// Takes the teacher's guard for the rest of `txn`.
pub(crate) async fn lock_teacher(
    txn: &DatabaseTransaction,
    teacher_id: TeacherId,
) -> Result<(), StoreError> {
    let row = txn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            TRY_LOCK_SQL,
            [teacher_id.to_string().into()],
        ))
        .await
        .map_err(db_err)?;

    let locked = match row {
        Some(row) => row.try_get::<bool>("", "locked").map_err(db_err)?,
        None => false,
    };

    if locked {
        Ok(())
    } else {
        tracing::debug!(%teacher_id, "Teacher guard busy");
        Err(StoreError::Busy(teacher_id))
    }
}

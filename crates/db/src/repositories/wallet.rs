//! Wallet ledger storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tutora_core::repository::{StoreError, WalletStore};
use tutora_core::wallet::{
    AllocationState, LedgerService, LedgerSnapshot, WalletEntry, WalletEntryStatus, WalletError,
};
use tutora_shared::types::{BookingId, PageRequest, TeacherId, WalletEntryId};
use uuid::Uuid;

use super::PgStore;
use super::convert::{self, db_err, stamp};
use super::guard::lock_teacher;
use crate::entities::{
    payout_allocations, payout_requests, sea_orm_active_enums as db, wallet_entries,
};

/// Loads every entry and allocation of a teacher through `conn`.
pub(super) async fn load_snapshot<C: ConnectionTrait>(
    conn: &C,
    teacher_id: TeacherId,
) -> Result<LedgerSnapshot, StoreError> {
    let entries = wallet_entries::Entity::find()
        .filter(wallet_entries::Column::TeacherId.eq(teacher_id.into_inner()))
        .order_by_asc(wallet_entries::Column::CreatedAt)
        .order_by_asc(wallet_entries::Column::Id)
        .all(conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(convert::wallet_entry)
        .collect();

    let allocations = payout_allocations::Entity::find()
        .find_also_related(payout_requests::Entity)
        .filter(payout_requests::Column::TeacherId.eq(teacher_id.into_inner()))
        .all(conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .filter_map(|(allocation, payout)| {
            payout.map(|payout| AllocationState {
                allocation: convert::payout_allocation(allocation),
                payout_status: payout.status.into(),
            })
        })
        .collect();

    Ok(LedgerSnapshot {
        entries,
        allocations,
    })
}

/// Sets `status` on the given entries through `conn`.
pub(super) async fn set_entry_status<C: ConnectionTrait>(
    conn: &C,
    ids: &[WalletEntryId],
    status: WalletEntryStatus,
) -> Result<(), StoreError> {
    if ids.is_empty() {
        return Ok(());
    }
    wallet_entries::Entity::update_many()
        .set(wallet_entries::ActiveModel {
            status: Set(status.into()),
            ..Default::default()
        })
        .filter(wallet_entries::Column::Id.is_in(ids.iter().copied().map(WalletEntryId::into_inner)))
        .exec(conn)
        .await
        .map_err(db_err)?;
    Ok(())
}

async fn find_by_kind<C: ConnectionTrait>(
    conn: &C,
    booking_id: BookingId,
    kind: db::WalletEntryKind,
) -> Result<Option<WalletEntry>, StoreError> {
    Ok(wallet_entries::Entity::find()
        .filter(wallet_entries::Column::BookingId.eq(booking_id.into_inner()))
        .filter(wallet_entries::Column::Kind.eq(kind))
        .one(conn)
        .await
        .map_err(db_err)?
        .map(convert::wallet_entry))
}

async fn insert_entry<C: ConnectionTrait>(
    conn: &C,
    entry: &WalletEntry,
) -> Result<WalletEntry, StoreError> {
    let model = wallet_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        teacher_id: Set(entry.teacher_id.into_inner()),
        booking_id: Set(entry.booking_id.into_inner()),
        kind: Set(entry.kind.into()),
        amount: Set(entry.amount.minor()),
        commission: Set(entry.commission.minor()),
        status: Set(entry.status.into()),
        available_at: Set(stamp(entry.available_at)),
        created_at: Set(stamp(entry.created_at)),
        reverses: Set(entry.reverses.map(WalletEntryId::into_inner)),
    };
    Ok(convert::wallet_entry(model.insert(conn).await.map_err(db_err)?))
}

#[async_trait]
impl WalletStore for PgStore {
    async fn record_earning(&self, entry: WalletEntry) -> Result<WalletEntry, WalletError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        lock_teacher(&txn, entry.teacher_id).await?;

        if let Some(existing) =
            find_by_kind(&txn, entry.booking_id, db::WalletEntryKind::Earning).await?
        {
            return Ok(existing);
        }

        let stored = insert_entry(&txn, &entry).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(stored)
    }

    async fn earning_for_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<WalletEntry>, StoreError> {
        find_by_kind(&self.db, booking_id, db::WalletEntryKind::Earning).await
    }

    async fn reverse_earning(
        &self,
        booking_id: BookingId,
        now: DateTime<Utc>,
    ) -> Result<WalletEntry, WalletError> {
        let teacher_id = self
            .earning_for_booking(booking_id)
            .await?
            .ok_or(WalletError::EarningNotFound(booking_id))?
            .teacher_id;

        let txn = self.db.begin().await.map_err(db_err)?;
        lock_teacher(&txn, teacher_id).await?;

        let original = find_by_kind(&txn, booking_id, db::WalletEntryKind::Earning)
            .await?
            .ok_or(WalletError::EarningNotFound(booking_id))?;
        let already_reversed = find_by_kind(&txn, booking_id, db::WalletEntryKind::Reversal)
            .await?
            .is_some();

        let reversal = LedgerService::reversal_for(&original, already_reversed, now)?;
        let stored = insert_entry(&txn, &reversal).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(stored)
    }

    async fn ledger_snapshot(&self, teacher_id: TeacherId) -> Result<LedgerSnapshot, StoreError> {
        load_snapshot(&self.db, teacher_id).await
    }

    async fn entries_for_teacher(
        &self,
        teacher_id: TeacherId,
        page: PageRequest,
    ) -> Result<(Vec<WalletEntry>, u64), StoreError> {
        let query = wallet_entries::Entity::find()
            .filter(wallet_entries::Column::TeacherId.eq(teacher_id.into_inner()));

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let rows = query
            .order_by_desc(wallet_entries::Column::CreatedAt)
            .order_by_desc(wallet_entries::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok((rows.into_iter().map(convert::wallet_entry).collect(), total))
    }

    async fn teachers_with_matured(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<TeacherId>, StoreError> {
        let reversed = Query::select()
            .column(wallet_entries::Column::Reverses)
            .from(wallet_entries::Entity)
            .and_where(wallet_entries::Column::Reverses.is_not_null())
            .to_owned();

        let teachers: Vec<Uuid> = wallet_entries::Entity::find()
            .select_only()
            .column(wallet_entries::Column::TeacherId)
            .distinct()
            .filter(wallet_entries::Column::Kind.eq(db::WalletEntryKind::Earning))
            .filter(wallet_entries::Column::Status.eq(db::WalletEntryStatus::Pending))
            .filter(wallet_entries::Column::AvailableAt.lte(stamp(now)))
            .filter(wallet_entries::Column::Id.not_in_subquery(reversed))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(teachers.into_iter().map(TeacherId::from_uuid).collect())
    }

    async fn promote_matured(
        &self,
        teacher_id: TeacherId,
        now: DateTime<Utc>,
    ) -> Result<Vec<WalletEntry>, StoreError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        lock_teacher(&txn, teacher_id).await?;

        let snapshot = load_snapshot(&txn, teacher_id).await?;
        let matured = snapshot.matured(now);
        set_entry_status(&txn, &matured, WalletEntryStatus::Available).await?;
        txn.commit().await.map_err(db_err)?;

        let promoted: Vec<WalletEntry> = snapshot
            .entries
            .into_iter()
            .filter(|entry| matured.contains(&entry.id))
            .map(|entry| WalletEntry {
                status: WalletEntryStatus::Available,
                ..entry
            })
            .collect();

        if !promoted.is_empty() {
            tracing::debug!(%teacher_id, promoted = promoted.len(), "Matured earnings promoted");
        }
        Ok(promoted)
    }
}

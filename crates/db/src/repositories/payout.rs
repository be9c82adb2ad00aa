//! Payout request storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tutora_core::payout::{
    PayoutAllocation, PayoutDraft, PayoutError, PayoutRequest, PayoutService, PayoutStatus,
};
use tutora_core::repository::{PayoutStore, StoreError};
use tutora_core::wallet::WalletEntryStatus;
use tutora_shared::types::{Money, PageRequest, PayoutRequestId, TeacherId};

use super::PgStore;
use super::convert::{self, db_err, stamp};
use super::guard::lock_teacher;
use super::wallet::{load_snapshot, set_entry_status};
use crate::entities::{payout_allocations, payout_requests, sea_orm_active_enums as db};

#[async_trait]
impl PayoutStore for PgStore {
    async fn create_payout(
        &self,
        draft: PayoutDraft,
        minimum: Money,
        now: DateTime<Utc>,
    ) -> Result<(PayoutRequest, Vec<PayoutAllocation>), PayoutError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        lock_teacher(&txn, draft.teacher_id).await?;

        let snapshot = load_snapshot(&txn, draft.teacher_id).await?;
        let planned = PayoutService::plan(&draft, &snapshot, minimum, now)?;
        let request = &planned.request;

        payout_requests::ActiveModel {
            id: Set(request.id.into_inner()),
            teacher_id: Set(request.teacher_id.into_inner()),
            amount: Set(request.amount.minor()),
            method: Set(request.method.into()),
            status: Set(request.status.into()),
            account_ref: Set(request.account_ref.clone()),
            requested_at: Set(stamp(request.requested_at)),
            processed_at: Set(None),
            failure_reason: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        if !planned.allocations.is_empty() {
            payout_allocations::Entity::insert_many(planned.allocations.iter().map(|allocation| {
                payout_allocations::ActiveModel {
                    payout_request_id: Set(allocation.payout_request_id.into_inner()),
                    wallet_entry_id: Set(allocation.wallet_entry_id.into_inner()),
                    amount: Set(allocation.amount.minor()),
                }
            }))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        Ok((planned.request, planned.allocations))
    }

    async fn find_payout(&self, id: PayoutRequestId) -> Result<Option<PayoutRequest>, StoreError> {
        Ok(payout_requests::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(convert::payout_request))
    }

    async fn allocations(&self, id: PayoutRequestId) -> Result<Vec<PayoutAllocation>, StoreError> {
        Ok(payout_allocations::Entity::find()
            .filter(payout_allocations::Column::PayoutRequestId.eq(id.into_inner()))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(convert::payout_allocation)
            .collect())
    }

    async fn update_payout(
        &self,
        payout: &PayoutRequest,
        expected: PayoutStatus,
    ) -> Result<PayoutRequest, PayoutError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        lock_teacher(&txn, payout.teacher_id).await?;

        let result = payout_requests::Entity::update_many()
            .set(payout_requests::ActiveModel {
                status: Set(payout.status.into()),
                processed_at: Set(payout.processed_at.map(stamp)),
                failure_reason: Set(payout.failure_reason.clone()),
                ..Default::default()
            })
            .filter(payout_requests::Column::Id.eq(payout.id.into_inner()))
            .filter(payout_requests::Column::Status.eq(db::PayoutStatus::from(expected)))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            let current = payout_requests::Entity::find_by_id(payout.id.into_inner())
                .one(&txn)
                .await
                .map_err(db_err)?;
            return Err(match current {
                Some(current) => PayoutError::InvalidTransition {
                    from: current.status.into(),
                    to: payout.status,
                },
                None => PayoutError::NotFound(payout.id),
            });
        }

        if payout.status == PayoutStatus::Paid {
            let snapshot = load_snapshot(&txn, payout.teacher_id).await?;
            set_entry_status(&txn, &snapshot.fully_paid(), WalletEntryStatus::Paid).await?;
        }

        txn.commit().await.map_err(db_err)?;
        Ok(payout.clone())
    }

    async fn payouts_for_teacher(
        &self,
        teacher_id: TeacherId,
        page: PageRequest,
    ) -> Result<(Vec<PayoutRequest>, u64), StoreError> {
        let query = payout_requests::Entity::find()
            .filter(payout_requests::Column::TeacherId.eq(teacher_id.into_inner()));

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let rows = query
            .order_by_desc(payout_requests::Column::RequestedAt)
            .order_by_desc(payout_requests::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok((rows.into_iter().map(convert::payout_request).collect(), total))
    }
}

//! Booking storage and the guarded reservation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tutora_core::booking::{Booking, BookingError, BookingStatus};
use tutora_core::repository::{BookingStore, StoreError};
use tutora_core::scheduling::Interval;
use tutora_shared::types::{BookingId, PageRequest, TeacherId};

use super::PgStore;
use super::convert::{self, db_err, stamp};
use super::guard::lock_teacher;
use crate::entities::{bookings, sea_orm_active_enums as db, wallet_entries};
use crate::migration::BOOKING_OVERLAP_CONSTRAINT;

fn active_statuses() -> [db::BookingStatus; 2] {
    [db::BookingStatus::Pending, db::BookingStatus::Confirmed]
}

fn slot_taken(booking: &Booking) -> BookingError {
    BookingError::SlotTaken {
        teacher_id: booking.teacher_id,
        start_at: booking.start_at,
        end_at: booking.end_at,
    }
}

fn is_overlap_violation(err: &DbErr) -> bool {
    err.to_string().contains(BOOKING_OVERLAP_CONSTRAINT)
}

fn overlapping(teacher_id: TeacherId, start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(bookings::Column::TeacherId.eq(teacher_id.into_inner()))
        .add(bookings::Column::Status.is_in(active_statuses()))
        .add(bookings::Column::StartAt.lt(stamp(end_at)))
        .add(bookings::Column::EndAt.gt(stamp(start_at)))
}

#[async_trait]
impl BookingStore for PgStore {
    async fn find_booking(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        Ok(bookings::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(convert::booking))
    }

    async fn active_bookings(
        &self,
        teacher_id: TeacherId,
        window: Interval,
    ) -> Result<Vec<Booking>, StoreError> {
        Ok(bookings::Entity::find()
            .filter(overlapping(teacher_id, window.start(), window.end()))
            .order_by_asc(bookings::Column::StartAt)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(convert::booking)
            .collect())
    }

    async fn reserve(&self, booking: Booking) -> Result<Booking, BookingError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        lock_teacher(&txn, booking.teacher_id).await?;

        let clashes = bookings::Entity::find()
            .filter(overlapping(booking.teacher_id, booking.start_at, booking.end_at))
            .count(&txn)
            .await
            .map_err(db_err)?;
        if clashes > 0 {
            return Err(slot_taken(&booking));
        }

        let model = bookings::ActiveModel {
            id: Set(booking.id.into_inner()),
            teacher_id: Set(booking.teacher_id.into_inner()),
            student_id: Set(booking.student_id.into_inner()),
            subject_offering_id: Set(booking.subject_offering_id.into_inner()),
            start_at: Set(stamp(booking.start_at)),
            end_at: Set(stamp(booking.end_at)),
            status: Set(booking.status.into()),
            booking_type: Set(booking.booking_type.into()),
            price: Set(booking.price.minor()),
            cancellation_reason: Set(booking.cancellation_reason.clone()),
            cancelled_by: Set(booking.cancelled_by.map(Into::into)),
            created_at: Set(stamp(booking.created_at)),
            updated_at: Set(stamp(booking.updated_at)),
            completed_at: Set(booking.completed_at.map(stamp)),
        };

        // The exclusion constraint backs up the guard.
        let inserted = match model.insert(&txn).await {
            Ok(inserted) => inserted,
            Err(err) if is_overlap_violation(&err) => return Err(slot_taken(&booking)),
            Err(err) => return Err(db_err(err).into()),
        };
        txn.commit().await.map_err(db_err)?;

        tracing::debug!(booking_id = %booking.id, teacher_id = %booking.teacher_id, "Booking reserved");
        Ok(convert::booking(inserted))
    }

    async fn update_booking(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> Result<Booking, BookingError> {
        let changes = bookings::ActiveModel {
            status: Set(booking.status.into()),
            cancellation_reason: Set(booking.cancellation_reason.clone()),
            cancelled_by: Set(booking.cancelled_by.map(Into::into)),
            updated_at: Set(stamp(booking.updated_at)),
            completed_at: Set(booking.completed_at.map(stamp)),
            ..Default::default()
        };

        let result = bookings::Entity::update_many()
            .set(changes)
            .filter(bookings::Column::Id.eq(booking.id.into_inner()))
            .filter(bookings::Column::Status.eq(db::BookingStatus::from(expected)))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return match self.find_booking(booking.id).await? {
                Some(current) => Err(BookingError::InvalidTransition {
                    from: current.status,
                    to: booking.status,
                }),
                None => Err(BookingError::NotFound(booking.id)),
            };
        }
        Ok(booking.clone())
    }

    async fn bookings_for_teacher(
        &self,
        teacher_id: TeacherId,
        page: PageRequest,
    ) -> Result<(Vec<Booking>, u64), StoreError> {
        let query = bookings::Entity::find()
            .filter(bookings::Column::TeacherId.eq(teacher_id.into_inner()));

        let total = query.clone().count(&self.db).await.map_err(db_err)?;
        let rows = query
            .order_by_desc(bookings::Column::StartAt)
            .order_by_desc(bookings::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok((rows.into_iter().map(convert::booking).collect(), total))
    }

    async fn due_for_settlement(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<Booking>, StoreError> {
        let due = Condition::any()
            .add(
                Condition::all()
                    .add(bookings::Column::Status.eq(db::BookingStatus::Confirmed))
                    .add(bookings::Column::EndAt.lte(stamp(now))),
            )
            .add(
                Condition::all()
                    .add(bookings::Column::Status.eq(db::BookingStatus::Pending))
                    .add(bookings::Column::StartAt.lte(stamp(now))),
            );

        Ok(bookings::Entity::find()
            .filter(due)
            .order_by_asc(bookings::Column::EndAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(convert::booking)
            .collect())
    }

    async fn completed_without_earning(&self, limit: u64) -> Result<Vec<Booking>, StoreError> {
        let earned = Query::select()
            .column(wallet_entries::Column::BookingId)
            .from(wallet_entries::Entity)
            .and_where(wallet_entries::Column::Kind.eq(db::WalletEntryKind::Earning))
            .to_owned();

        Ok(bookings::Entity::find()
            .filter(bookings::Column::Status.eq(db::BookingStatus::Completed))
            .filter(bookings::Column::Id.not_in_subquery(earned))
            .order_by_asc(bookings::Column::CompletedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(convert::booking)
            .collect())
    }
}

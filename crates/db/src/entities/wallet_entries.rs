//! `SeaORM` Entity for wallet_entries table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{WalletEntryKind, WalletEntryStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wallet_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub booking_id: Uuid,
    pub kind: WalletEntryKind,
    pub amount: i64,
    pub commission: i64,
    pub status: WalletEntryStatus,
    pub available_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub reverses: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bookings::Entity",
        from = "Column::BookingId",
        to = "super::bookings::Column::Id"
    )]
    Bookings,
    #[sea_orm(has_many = "super::payout_allocations::Entity")]
    PayoutAllocations,
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::payout_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayoutAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

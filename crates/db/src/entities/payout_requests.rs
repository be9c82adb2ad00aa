//! `SeaORM` Entity for payout_requests table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{PayoutMethod, PayoutStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payout_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub amount: i64,
    pub method: PayoutMethod,
    pub status: PayoutStatus,
    pub account_ref: String,
    pub requested_at: DateTimeWithTimeZone,
    pub processed_at: Option<DateTimeWithTimeZone>,
    pub failure_reason: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payout_allocations::Entity")]
    PayoutAllocations,
}

impl Related<super::payout_allocations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayoutAllocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

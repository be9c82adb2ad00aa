//! `SeaORM` Entity for payout_allocations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payout_allocations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub payout_request_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub wallet_entry_id: Uuid,
    pub amount: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payout_requests::Entity",
        from = "Column::PayoutRequestId",
        to = "super::payout_requests::Column::Id"
    )]
    PayoutRequests,
    #[sea_orm(
        belongs_to = "super::wallet_entries::Entity",
        from = "Column::WalletEntryId",
        to = "super::wallet_entries::Column::Id"
    )]
    WalletEntries,
}

impl Related<super::payout_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayoutRequests.def()
    }
}

impl Related<super::wallet_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WalletEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

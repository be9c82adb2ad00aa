//! `SeaORM` Entity for bookings table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{BookingParty, BookingStatus, BookingType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub student_id: Uuid,
    pub subject_offering_id: Uuid,
    pub start_at: DateTimeWithTimeZone,
    pub end_at: DateTimeWithTimeZone,
    pub status: BookingStatus,
    pub booking_type: BookingType,
    pub price: i64,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<BookingParty>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub completed_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::subject_offerings::Entity",
        from = "Column::SubjectOfferingId",
        to = "super::subject_offerings::Column::Id"
    )]
    SubjectOfferings,
    #[sea_orm(has_many = "super::wallet_entries::Entity")]
    WalletEntries,
}

impl Related<super::subject_offerings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubjectOfferings.def()
    }
}

impl Related<super::wallet_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WalletEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

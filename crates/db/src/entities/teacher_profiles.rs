//! `SeaORM` Entity for teacher_profiles table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teacher_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub teacher_id: Uuid,
    pub timezone: String,
    /// JSON array of lesson lengths in minutes.
    #[sea_orm(column_type = "JsonBinary")]
    pub allowed_durations: Json,
    pub instant_confirmation: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::subject_offerings::Entity")]
    SubjectOfferings,
}

impl Related<super::subject_offerings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubjectOfferings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

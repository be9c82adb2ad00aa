//! `SeaORM` Entity for subject_offerings table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subject_offerings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub subject: String,
    pub price_per_hour: i64,
    pub trial_price: Option<i64>,
    pub active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::teacher_profiles::Entity",
        from = "Column::TeacherId",
        to = "super::teacher_profiles::Column::TeacherId"
    )]
    TeacherProfiles,
}

impl Related<super::teacher_profiles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeacherProfiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for availability_rules table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::AvailabilityRuleType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "availability_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub rule_type: AvailabilityRuleType,
    /// Local date of an exception rule.
    pub rule_date: Option<Date>,
    /// The full rule as tagged JSON.
    #[sea_orm(column_type = "JsonBinary")]
    pub definition: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
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

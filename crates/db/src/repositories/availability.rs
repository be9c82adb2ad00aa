//! Availability rule storage.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};
use tutora_core::availability::{AvailabilityError, AvailabilityRule};
use tutora_core::repository::{AvailabilityStore, StoreError};
use tutora_shared::types::{AvailabilityRuleId, TeacherId};

use super::PgStore;
use super::convert::{self, db_err};
use crate::entities::availability_rules;
use crate::migration::EXCEPTION_DATE_INDEX;

fn is_duplicate_exception(err: &DbErr) -> bool {
    err.to_string().contains(EXCEPTION_DATE_INDEX)
}

#[async_trait]
impl AvailabilityStore for PgStore {
    async fn rules_for_teacher(
        &self,
        teacher_id: TeacherId,
    ) -> Result<Vec<AvailabilityRule>, StoreError> {
        availability_rules::Entity::find()
            .filter(availability_rules::Column::TeacherId.eq(teacher_id.into_inner()))
            .order_by_asc(availability_rules::Column::CreatedAt)
            .order_by_asc(availability_rules::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(convert::availability_rule)
            .collect()
    }

    async fn find_rule(
        &self,
        id: AvailabilityRuleId,
    ) -> Result<Option<AvailabilityRule>, StoreError> {
        availability_rules::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(convert::availability_rule)
            .transpose()
    }

    async fn save_rule(&self, rule: &AvailabilityRule) -> Result<(), AvailabilityError> {
        let now = Utc::now().into();
        let rule_date = match rule {
            AvailabilityRule::Exception(exception) => Some(exception.date),
            AvailabilityRule::Recurring(_) => None,
        };

        let model = availability_rules::ActiveModel {
            id: Set(rule.id().into_inner()),
            teacher_id: Set(rule.teacher_id().into_inner()),
            rule_type: Set(convert::rule_type(rule)),
            rule_date: Set(rule_date),
            definition: Set(convert::rule_definition(rule)?),
            created_at: Set(now),
            updated_at: Set(now),
        };

        availability_rules::Entity::insert(model)
            .on_conflict(
                OnConflict::column(availability_rules::Column::Id)
                    .update_columns([
                        availability_rules::Column::RuleType,
                        availability_rules::Column::RuleDate,
                        availability_rules::Column::Definition,
                        availability_rules::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|err| match rule_date {
                Some(date) if is_duplicate_exception(&err) => {
                    AvailabilityError::DuplicateException(date)
                }
                _ => db_err(err).into(),
            })?;

        tracing::debug!(rule_id = %rule.id(), teacher_id = %rule.teacher_id(), "Availability rule saved");
        Ok(())
    }

    async fn delete_rule(
        &self,
        teacher_id: TeacherId,
        id: AvailabilityRuleId,
    ) -> Result<bool, StoreError> {
        let result = availability_rules::Entity::delete_many()
            .filter(availability_rules::Column::Id.eq(id.into_inner()))
            .filter(availability_rules::Column::TeacherId.eq(teacher_id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }
}

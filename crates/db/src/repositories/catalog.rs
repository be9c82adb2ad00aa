//! Read-only catalog lookups.

use async_trait::async_trait;
use sea_orm::EntityTrait;
use tutora_core::catalog::{SubjectOffering, TeacherProfile};
use tutora_core::repository::{CatalogStore, StoreError};
use tutora_shared::types::{SubjectOfferingId, TeacherId};

use super::PgStore;
use super::convert::{self, db_err};
use crate::entities::{subject_offerings, teacher_profiles};

#[async_trait]
impl CatalogStore for PgStore {
    async fn teacher_profile(
        &self,
        teacher_id: TeacherId,
    ) -> Result<Option<TeacherProfile>, StoreError> {
        teacher_profiles::Entity::find_by_id(teacher_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(convert::teacher_profile)
            .transpose()
    }

    async fn subject_offering(
        &self,
        id: SubjectOfferingId,
    ) -> Result<Option<SubjectOffering>, StoreError> {
        Ok(subject_offerings::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(convert::subject_offering))
    }
}

//! Availability rule management.

use std::sync::Arc;

use tutora_shared::types::{AvailabilityRuleId, TeacherId};

use crate::availability::{AvailabilityError, AvailabilityRule};
use crate::repository::{AvailabilityStore, CatalogStore};

/// Lists and edits a teacher's availability rules.
#[derive(Clone)]
pub struct AvailabilityEngine {
    rules: Arc<dyn AvailabilityStore>,
    catalog: Arc<dyn CatalogStore>,
}

impl AvailabilityEngine {
    /// Creates the engine.
    pub fn new(rules: Arc<dyn AvailabilityStore>, catalog: Arc<dyn CatalogStore>) -> Self {
        Self { rules, catalog }
    }

    /// All rules of a teacher.
    pub async fn list_rules(
        &self,
        teacher_id: TeacherId,
    ) -> Result<Vec<AvailabilityRule>, AvailabilityError> {
        self.ensure_teacher(teacher_id).await?;
        Ok(self.rules.rules_for_teacher(teacher_id).await?)
    }

    /// Stores a new rule under a fresh id.
    pub async fn create_rule(
        &self,
        teacher_id: TeacherId,
        rule: AvailabilityRule,
    ) -> Result<AvailabilityRule, AvailabilityError> {
        self.ensure_teacher(teacher_id).await?;

        let rule = rule.with_identity(AvailabilityRuleId::new(), teacher_id);
        rule.validate()?;
        self.rules.save_rule(&rule).await?;

        tracing::info!(%teacher_id, rule_id = %rule.id(), "Availability rule created");
        Ok(rule)
    }

    /// Replaces an existing rule in place.
    pub async fn update_rule(
        &self,
        teacher_id: TeacherId,
        rule_id: AvailabilityRuleId,
        rule: AvailabilityRule,
    ) -> Result<AvailabilityRule, AvailabilityError> {
        match self.rules.find_rule(rule_id).await? {
            Some(existing) if existing.teacher_id() == teacher_id => {}
            _ => return Err(AvailabilityError::RuleNotFound(rule_id)),
        }

        let rule = rule.with_identity(rule_id, teacher_id);
        rule.validate()?;
        self.rules.save_rule(&rule).await?;

        tracing::info!(%teacher_id, %rule_id, "Availability rule updated");
        Ok(rule)
    }

    /// Deletes a rule.
    pub async fn delete_rule(
        &self,
        teacher_id: TeacherId,
        rule_id: AvailabilityRuleId,
    ) -> Result<(), AvailabilityError> {
        if !self.rules.delete_rule(teacher_id, rule_id).await? {
            return Err(AvailabilityError::RuleNotFound(rule_id));
        }
        tracing::info!(%teacher_id, %rule_id, "Availability rule deleted");
        Ok(())
    }

    async fn ensure_teacher(&self, teacher_id: TeacherId) -> Result<(), AvailabilityError> {
        match self.catalog.teacher_profile(teacher_id).await? {
            Some(_) => Ok(()),
            None => Err(AvailabilityError::TeacherNotFound(teacher_id)),
        }
    }
}

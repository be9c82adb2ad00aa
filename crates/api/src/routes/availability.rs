//! Availability rule routes.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};
use chrono::{NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{Value, json};
use tutora_core::availability::{
    AvailabilityRule, ExceptionKind, ExceptionRule, RecurringRule, TimeWindow,
};
use tutora_shared::types::{AvailabilityRuleId, TeacherId};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::AppState;
use super::validated;

/// Creates the availability routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/teachers/{teacher_id}/availability",
            get(list_rules).post(create_rule),
        )
        .route(
            "/teachers/{teacher_id}/availability/{rule_id}",
            put(update_rule).delete(delete_rule),
        )
}

/// Kind of rule in a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Weekly window.
    Recurring,
    /// One-date override.
    Exception,
}

/// Request body for creating or replacing a rule.
///
/// Recurring rules need `weekday`, `start` and `end`. Exceptions need `date`;
/// with `start` and `end` they replace that day's windows, without them they
/// block the day.
#[derive(Debug, Deserialize, Validate)]
pub struct AvailabilityRuleRequest {
    /// Rule kind.
    #[serde(rename = "type")]
    pub kind: RuleKind,
    /// IANA timezone of the window.
    #[validate(length(min = 1, max = 64))]
    pub timezone: String,
    /// Weekday of a recurring rule.
    pub weekday: Option<Weekday>,
    /// Date of an exception.
    pub date: Option<NaiveDate>,
    /// Window start (local time).
    pub start: Option<NaiveTime>,
    /// Window end (local time); `00:00` means midnight.
    pub end: Option<NaiveTime>,
    /// First date a recurring rule applies.
    pub valid_from: Option<NaiveDate>,
    /// Last date a recurring rule applies.
    pub valid_until: Option<NaiveDate>,
}

impl AvailabilityRuleRequest {
    /// Builds the domain rule; ids are assigned by the engine.
    pub fn into_rule(self, teacher_id: TeacherId) -> ApiResult<AvailabilityRule> {
        let timezone = Tz::from_str(&self.timezone)
            .map_err(|_| ApiError::validation(format!("unknown timezone {}", self.timezone)))?;
        let window = match (self.start, self.end) {
            (Some(start), Some(end)) => Some(TimeWindow::new(start, end)?),
            (None, None) => None,
            _ => return Err(ApiError::validation("start and end must be given together")),
        };

        match self.kind {
            RuleKind::Recurring => {
                let weekday = self
                    .weekday
                    .ok_or_else(|| ApiError::validation("weekday is required"))?;
                let window =
                    window.ok_or_else(|| ApiError::validation("start and end are required"))?;
                Ok(AvailabilityRule::Recurring(RecurringRule {
                    id: AvailabilityRuleId::new(),
                    teacher_id,
                    weekday,
                    window,
                    timezone,
                    valid_from: self.valid_from,
                    valid_until: self.valid_until,
                }))
            }
            RuleKind::Exception => {
                let date = self
                    .date
                    .ok_or_else(|| ApiError::validation("date is required"))?;
                Ok(AvailabilityRule::Exception(ExceptionRule {
                    id: AvailabilityRuleId::new(),
                    teacher_id,
                    date,
                    timezone,
                    kind: window.map_or(ExceptionKind::Blocked, ExceptionKind::Replaced),
                }))
            }
        }
    }
}

/// GET `/teachers/{teacher_id}/availability`
async fn list_rules(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(teacher_id): Path<TeacherId>,
) -> ApiResult<Json<Value>> {
    let rules = state.engines.availability.list_rules(teacher_id).await?;
    Ok(Json(json!({ "data": rules })))
}

/// POST `/teachers/{teacher_id}/availability`
async fn create_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(teacher_id): Path<TeacherId>,
    Json(payload): Json<AvailabilityRuleRequest>,
) -> ApiResult<(StatusCode, Json<AvailabilityRule>)> {
    auth.require_teacher_or_admin(teacher_id)?;
    let rule = validated(payload)?.into_rule(teacher_id)?;

    let rule = state
        .engines
        .availability
        .create_rule(teacher_id, rule)
        .await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

/// PUT `/teachers/{teacher_id}/availability/{rule_id}`
async fn update_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((teacher_id, rule_id)): Path<(TeacherId, AvailabilityRuleId)>,
    Json(payload): Json<AvailabilityRuleRequest>,
) -> ApiResult<Json<AvailabilityRule>> {
    auth.require_teacher_or_admin(teacher_id)?;
    let rule = validated(payload)?.into_rule(teacher_id)?;

    let rule = state
        .engines
        .availability
        .update_rule(teacher_id, rule_id, rule)
        .await?;
    Ok(Json(rule))
}

/// DELETE `/teachers/{teacher_id}/availability/{rule_id}`
async fn delete_rule(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((teacher_id, rule_id)): Path<(TeacherId, AvailabilityRuleId)>,
) -> ApiResult<StatusCode> {
    auth.require_teacher_or_admin(teacher_id)?;
    state
        .engines
        .availability
        .delete_rule(teacher_id, rule_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

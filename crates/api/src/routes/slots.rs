//! Bookable slot lookup.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::{Value, json};
use tutora_core::booking::BookingType;
use tutora_core::scheduling::{SlotQuery, TimeSlot};
use tutora_shared::types::{SubjectOfferingId, TeacherId};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::AppState;
use super::validated;

/// Creates the slot routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/teachers/{teacher_id}/slots", get(available_slots))
}

/// Query string of the slot lookup.
#[derive(Debug, Deserialize, Validate)]
pub struct SlotsParams {
    /// First local date (inclusive).
    pub from: NaiveDate,
    /// Last local date (inclusive).
    pub to: NaiveDate,
    /// Lesson length in minutes.
    #[validate(range(min = 1, max = 1440))]
    pub duration: u32,
    /// IANA timezone the dates are expressed in.
    #[validate(length(min = 1, max = 64))]
    pub timezone: String,
    /// Offering that prices the slots.
    pub subject_offering_id: SubjectOfferingId,
    /// Kind of lesson, single by default.
    #[serde(default)]
    pub booking_type: Option<BookingType>,
}

/// GET `/teachers/{teacher_id}/slots`
async fn available_slots(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(teacher_id): Path<TeacherId>,
    Query(params): Query<SlotsParams>,
) -> ApiResult<Json<Value>> {
    let params = validated(params)?;
    let timezone = Tz::from_str(&params.timezone)
        .map_err(|_| ApiError::validation(format!("unknown timezone {}", params.timezone)))?;

    let query = SlotQuery {
        teacher_id,
        from: params.from,
        to: params.to,
        duration_minutes: params.duration,
        timezone,
    };
    let schedule = state
        .engines
        .bookings
        .available_slots(
            &query,
            params.subject_offering_id,
            params.booking_type.unwrap_or(BookingType::Single),
            Utc::now(),
        )
        .await?;

    let slots: Vec<TimeSlot> = schedule.iter().collect();
    Ok(Json(json!({ "data": slots })))
}

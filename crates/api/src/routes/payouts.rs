//! Teacher payout routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;
use tutora_core::engine::PayoutDetails;
use tutora_core::payout::{PayoutDraft, PayoutMethod, PayoutRequest};
use tutora_shared::types::{Money, PageRequest, PageResponse, TeacherId};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::AppState;
use super::validated;

/// Creates the payout routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/teachers/{teacher_id}/payouts",
        get(list_payouts).post(request_payout),
    )
}

/// Request body for a payout.
#[derive(Debug, Deserialize, Validate)]
pub struct RequestPayoutRequest {
    /// Amount in minor units.
    #[validate(range(min = 1))]
    pub amount: i64,
    /// Payout method.
    pub method: PayoutMethod,
    /// Bank account or e-wallet reference.
    #[validate(length(min = 1, max = 64))]
    pub account_ref: String,
}

/// POST `/teachers/{teacher_id}/payouts` - Only the teacher may withdraw.
async fn request_payout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(teacher_id): Path<TeacherId>,
    Json(payload): Json<RequestPayoutRequest>,
) -> ApiResult<(StatusCode, Json<PayoutDetails>)> {
    if !auth.is_teacher(teacher_id) {
        return Err(ApiError::forbidden("Only the teacher can request a payout"));
    }
    let payload = validated(payload)?;

    let details = state
        .engines
        .payouts
        .request_payout(
            PayoutDraft {
                teacher_id,
                amount: Money::from_minor(payload.amount),
                method: payload.method,
                account_ref: payload.account_ref,
            },
            Utc::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// GET `/teachers/{teacher_id}/payouts`
async fn list_payouts(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(teacher_id): Path<TeacherId>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<PayoutRequest>>> {
    auth.require_teacher_or_admin(teacher_id)?;
    Ok(Json(state.engines.payouts.list(teacher_id, page).await?))
}

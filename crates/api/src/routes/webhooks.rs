//! Payment gateway callbacks.
//!
//! Deliveries may repeat; a callback for a payout already in the reported
//! state succeeds without changing it.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use chrono::Utc;
use serde::Deserialize;
use tutora_core::payout::PayoutRequest;
use tutora_shared::types::PayoutRequestId;
use validator::Validate;

use crate::error::ApiResult;
use crate::AppState;
use super::validated;

/// Creates the webhook routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/webhooks/payouts/{payout_id}/paid", post(payout_paid))
        .route("/webhooks/payouts/{payout_id}/failed", post(payout_failed))
}

/// Body of a failure callback.
#[derive(Debug, Deserialize, Validate)]
pub struct PayoutFailedRequest {
    /// Gateway's failure reason.
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

/// POST `/webhooks/payouts/{payout_id}/paid`
async fn payout_paid(
    State(state): State<AppState>,
    Path(payout_id): Path<PayoutRequestId>,
) -> ApiResult<Json<PayoutRequest>> {
    let payout = state.engines.payouts.on_paid(payout_id, Utc::now()).await?;
    Ok(Json(payout))
}

/// POST `/webhooks/payouts/{payout_id}/failed`
async fn payout_failed(
    State(state): State<AppState>,
    Path(payout_id): Path<PayoutRequestId>,
    Json(payload): Json<PayoutFailedRequest>,
) -> ApiResult<Json<PayoutRequest>> {
    let payload = validated(payload)?;
    let payout = state
        .engines
        .payouts
        .on_failed(payout_id, &payload.reason, Utc::now())
        .await?;
    Ok(Json(payout))
}

//! Admin routes: payout review and earning reversals.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use chrono::Utc;
use serde::Deserialize;
use tutora_core::payout::PayoutRequest;
use tutora_core::wallet::WalletEntry;
use tutora_shared::types::{BookingId, PayoutRequestId};
use validator::Validate;

use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::AppState;
use super::validated;

/// Creates the admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/payouts/{payout_id}/approve", post(approve_payout))
        .route("/admin/payouts/{payout_id}/reject", post(reject_payout))
        .route(
            "/admin/bookings/{booking_id}/reverse-earning",
            post(reverse_earning),
        )
}

/// Request body carrying a mandatory reason.
#[derive(Debug, Deserialize, Validate)]
pub struct ReasonRequest {
    /// Free-text reason.
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

/// POST `/admin/payouts/{payout_id}/approve`
async fn approve_payout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(payout_id): Path<PayoutRequestId>,
) -> ApiResult<Json<PayoutRequest>> {
    auth.require_admin()?;
    let payout = state.engines.payouts.approve(payout_id, Utc::now()).await?;
    Ok(Json(payout))
}

/// POST `/admin/payouts/{payout_id}/reject`
async fn reject_payout(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(payout_id): Path<PayoutRequestId>,
    Json(payload): Json<ReasonRequest>,
) -> ApiResult<Json<PayoutRequest>> {
    auth.require_admin()?;
    let payload = validated(payload)?;
    let payout = state
        .engines
        .payouts
        .reject(payout_id, &payload.reason, Utc::now())
        .await?;
    Ok(Json(payout))
}

/// POST `/admin/bookings/{booking_id}/reverse-earning`
async fn reverse_earning(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(booking_id): Path<BookingId>,
    Json(payload): Json<ReasonRequest>,
) -> ApiResult<(StatusCode, Json<WalletEntry>)> {
    auth.require_admin()?;
    let payload = validated(payload)?;
    let reversal = state
        .engines
        .wallet
        .reverse_earning(booking_id, &payload.reason, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(reversal)))
}

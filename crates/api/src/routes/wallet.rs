//! Wallet routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use tutora_core::wallet::{WalletBalance, WalletEntry};
use tutora_shared::types::{PageRequest, PageResponse, TeacherId};

use crate::error::ApiResult;
use crate::middleware::AuthUser;
use crate::AppState;

/// Creates the wallet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/teachers/{teacher_id}/wallet", get(get_balance))
        .route("/teachers/{teacher_id}/wallet/entries", get(list_entries))
}

/// GET `/teachers/{teacher_id}/wallet`
async fn get_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(teacher_id): Path<TeacherId>,
) -> ApiResult<Json<WalletBalance>> {
    auth.require_teacher_or_admin(teacher_id)?;
    Ok(Json(state.engines.wallet.balance(teacher_id).await?))
}

/// GET `/teachers/{teacher_id}/wallet/entries`
async fn list_entries(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(teacher_id): Path<TeacherId>,
    Query(page): Query<PageRequest>,
) -> ApiResult<Json<PageResponse<WalletEntry>>> {
    auth.require_teacher_or_admin(teacher_id)?;
    Ok(Json(
        state.engines.wallet.list_entries(teacher_id, page).await?,
    ))
}

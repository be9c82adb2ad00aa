//! Shared-secret check for payment gateway callbacks.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::error::ApiError;

/// Header carrying the webhook secret.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// Rejects callbacks without the configured secret.
pub async fn webhook_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|h| h.to_str().ok());

    match provided {
        Some(secret) if !state.webhook_secret.is_empty() && constant_eq(secret, &state.webhook_secret) => {
            next.run(request).await
        }
        _ => {
            tracing::warn!(path = %request.uri().path(), "Webhook rejected: bad secret");
            ApiError::unauthorized("Invalid webhook secret").into_response()
        }
    }
}

fn constant_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}

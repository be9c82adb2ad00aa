//! API route definitions.

use axum::{Router, middleware};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{auth_middleware, webhook_middleware};
use crate::AppState;

pub mod admin;
pub mod availability;
pub mod bookings;
pub mod health;
pub mod payouts;
pub mod slots;
pub mod wallet;
pub mod webhooks;

/// Creates the API router; protected routes get the auth layer, webhooks the secret check.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(slots::routes())
        .merge(bookings::routes())
        .merge(availability::routes())
        .merge(wallet::routes())
        .merge(payouts::routes())
        .merge(admin::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let webhook_routes = webhooks::routes().layer(middleware::from_fn_with_state(
        state,
        webhook_middleware,
    ));

    Router::new()
        .merge(health::routes())
        .merge(webhook_routes)
        .merge(protected_routes)
}

/// Runs `validator` rules on a request body.
pub(crate) fn validated<T: Validate>(payload: T) -> ApiResult<T> {
    payload.validate().map_err(ApiError::from)?;
    Ok(payload)
}

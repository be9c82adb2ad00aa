//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Bearer token and webhook secret middleware
//! - Request DTOs validated at the boundary
//! - Mapping of domain errors to JSON error bodies

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tutora_core::engine::Engines;
use tutora_shared::JwtService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Domain engines over the configured store.
    pub engines: Engines,
    /// JWT service for bearer token validation.
    pub jwt_service: Arc<JwtService>,
    /// Shared secret the payment gateway sends with webhooks.
    pub webhook_secret: Arc<str>,
}

impl AppState {
    /// Creates the state.
    #[must_use]
    pub fn new(engines: Engines, jwt_service: JwtService, webhook_secret: &str) -> Self {
        Self {
            engines,
            jwt_service: Arc::new(jwt_service),
            webhook_secret: Arc::from(webhook_secret),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

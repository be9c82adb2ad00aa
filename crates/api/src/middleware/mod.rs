//! Request middleware and extractors.

pub mod auth;
pub mod webhook;

pub use auth::{AuthUser, auth_middleware};
pub use webhook::{WEBHOOK_SECRET_HEADER, webhook_middleware};

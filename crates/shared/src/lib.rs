//! Shared types, errors, and configuration for Tutora.
//!
//! This crate provides common types used across all other crates:
//! - Money in integer minor units
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Startup and infrastructure error types
//! - Configuration management
//! - Bearer token claims and validation

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::{Claims, Role};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtError, JwtService};

//! Persistence layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Database migrations
//! - [`PgStore`], the PostgreSQL implementation of the core repository traits
//! - [`MemoryStore`], an in-process implementation for development and tests

pub mod entities;
pub mod memory;
pub mod migration;
pub mod repositories;

pub use memory::MemoryStore;
pub use repositories::PgStore;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tutora_shared::config::DatabaseConfig;
use tutora_shared::{AppError, AppResult};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Opens a pool sized by `config`.
///
/// # Errors
///
/// Returns `AppError::InvalidConfig` if no URL is configured and
/// `AppError::Database` if the connection fails.
pub async fn connect_with(config: &DatabaseConfig) -> AppResult<DatabaseConnection> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| AppError::InvalidConfig("database.url is not configured".to_string()))?;

    let mut options = ConnectOptions::new(url.to_string());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Connecting to database"
    );
    Database::connect(options)
        .await
        .map_err(|err| AppError::Database(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_with_requires_url() {
        let err = connect_with(&DatabaseConfig::default()).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidConfig(_)));
        assert!(!err.is_retryable());
    }
}

//! Infrastructure errors raised while bringing the service up.
//!
//! Request-path failures are domain errors owned by `tutora-core`; `AppError`
//! covers configuration and connection failures around them.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Startup and infrastructure failures.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration sources could not be read or deserialized.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration loaded but a value is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The database could not be reached.
    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    /// Returns the error code used in logs and health output.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) | Self::InvalidConfig(_) => "CONFIGURATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Whether retrying the same startup step can succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

//! Error responses.
//!
//! Every domain error knows its code and status; this module turns them into
//! `{"error": CODE, "message": ...}` bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tutora_core::availability::AvailabilityError;
use tutora_core::booking::BookingError;
use tutora_core::payout::PayoutError;
use tutora_core::scheduling::SchedulingError;
use tutora_core::wallet::WalletError;
use validator::ValidationErrors;

/// Error returned by handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Creates an error with an explicit status and code.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 400 with `VALIDATION_ERROR`.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    /// 403 with `FORBIDDEN`.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    /// 401 with `UNAUTHORIZED`.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    fn domain(status: u16, code: &'static str, message: String) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            code,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = if self.status.is_server_error() {
            tracing::error!(code = self.code, error = %self.message, "Request failed");
            "Internal server error".to_string()
        } else {
            self.message
        };

        (
            self.status,
            Json(json!({ "error": self.code, "message": message })),
        )
            .into_response()
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        Self::domain(err.http_status_code(), err.error_code(), err.to_string())
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        Self::domain(err.http_status_code(), err.error_code(), err.to_string())
    }
}

impl From<PayoutError> for ApiError {
    fn from(err: PayoutError) -> Self {
        Self::domain(err.http_status_code(), err.error_code(), err.to_string())
    }
}

impl From<AvailabilityError> for ApiError {
    fn from(err: AvailabilityError) -> Self {
        Self::domain(err.http_status_code(), err.error_code(), err.to_string())
    }
}

impl From<SchedulingError> for ApiError {
    fn from(err: SchedulingError) -> Self {
        Self::domain(err.http_status_code(), err.error_code(), err.to_string())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        Self::validation(err.to_string())
    }
}

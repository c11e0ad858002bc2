use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoucherError {
    #[error("Voucher not found")]
    NotFound,
    #[error("Voucher is inactive")]
    Inactive,
    #[error("Voucher has expired")]
    Expired,
    #[error("Order amount is below the voucher minimum")]
    BelowMinimum,
    #[error("Voucher usage limit reached")]
    UsageExhausted,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Package is not available for purchase")]
    PackageNotAvailable,
    #[error("Booking has expired")]
    BookingExpired,
    #[error(transparent)]
    Voucher(#[from] VoucherError),
    #[error("Requested slot conflicts with the therapist's calendar")]
    SlotConflict,
    #[error("Scheduling provider timed out")]
    GatewayTimeout,
    #[error("Platform fee percent out of range: {0}")]
    InvalidFeePercent(i64),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    /// True when the underlying database error is a unique-constraint
    /// violation (SQLite 2067/1555, Postgres 23505).
    pub fn is_unique_violation(&self) -> bool {
        if let AppError::Database(e) = self {
            if let Some(db_err) = e.as_database_error() {
                let code = db_err.code().unwrap_or_default();
                return code == "2067" || code == "1555" || code == "23505";
            }
        }
        false
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                if self.is_unique_violation() {
                    return (
                        StatusCode::CONFLICT,
                        Json(json!({ "error": "Resource already exists (duplicate entry)" }))
                    ).into_response();
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::PackageNotAvailable => (StatusCode::CONFLICT, self.to_string()),
            AppError::BookingExpired => (StatusCode::GONE, self.to_string()),
            AppError::Voucher(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
            AppError::SlotConflict => (StatusCode::CONFLICT, self.to_string()),
            AppError::GatewayTimeout => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            AppError::InvalidFeePercent(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// User-facing error messages shared across handlers.
pub mod msg {
    pub const ORDER_NOT_FOUND: &str = "Order not found";
    pub const INVALID_REFERENCE: &str = "Payment reference is not recognized";
    pub const ORDER_ALREADY_PAID: &str = "Order has already been paid and cannot be deleted";
    pub const ORDER_NOT_PAID: &str = "Order has not been paid";
    pub const ORDER_NOT_AWAITING_PAYMENT: &str = "Order is no longer awaiting payment";
    pub const STATUS_CHANGED: &str = "Order status changed concurrently, reload and retry";
    pub const ORDER_MODIFIED: &str = "Order was modified since it was read, reload and retry";
    pub const PAYMENT_REQUIRED_FOR_PROGRESS: &str =
        "Order must be paid before fulfillment can progress";
    pub const NEGATIVE_TOTAL: &str = "Order total must not be negative";
    pub const EMPTY_CUSTOMER: &str = "customer_id is required";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone())),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", Some(msg.clone())),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Turns a missing row into `AppError::NotFound`.
pub trait OptionExt<T> {
    fn or_not_found(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(msg.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

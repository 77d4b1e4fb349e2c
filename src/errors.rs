use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::db::repository::StoreError;
use crate::services::validation::FieldErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation failed: {0}")]
    InvalidFields(FieldErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // Carries the short, caller-facing summary; the raw processor body is logged where it happens.
    #[error("Payment processor error: {0}")]
    PaymentProvider(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Payment {capture_id} for order {order_id} was captured but the booking was not recorded")]
    BookingNotRecorded { order_id: String, capture_id: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(what),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::InvalidFields(errors)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidFields(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::PaymentProvider(_)
            | AppError::Database(_)
            | AppError::BookingNotRecorded { .. }
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Responding with {}: {}", status, self);
        }

        let body = match self {
            AppError::Validation(m) => json!({"error": "Validation error", "message": m}),
            AppError::InvalidFields(fields) => json!({
                "error": "Validation error",
                "message": fields.to_string(),
                "fields": fields,
            }),
            AppError::Unauthorized(m) => json!({"error": "Unauthorized", "message": m}),
            AppError::Forbidden(m) => json!({"error": "Forbidden", "message": m}),
            AppError::NotFound(m) => json!({"error": "Not found", "message": m}),
            AppError::Config(m) => json!({"error": "Configuration error", "message": m}),
            AppError::PaymentProvider(m) => json!({
                "error": m,
                "message": "The payment could not be processed. Please try again or contact support.",
            }),
            AppError::Database(_) => json!({
                "error": "Database error",
                "message": "The request could not be completed. Please try again later.",
            }),
            AppError::BookingNotRecorded { order_id, .. } => json!({
                "error": "Booking not recorded",
                "message": format!(
                    "Your payment may have been processed but the booking could not be saved. \
                     Please contact support and quote order {}.",
                    order_id
                ),
            }),
            AppError::Internal(_) => json!({
                "error": "Internal server error",
                "message": "An unexpected error occurred.",
            }),
        };

        HttpResponse::build(status).json(body)
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

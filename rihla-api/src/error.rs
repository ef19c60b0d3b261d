use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use rihla_booking::allocator::AllocationError;
use rihla_booking::lifecycle::LifecycleError;
use rihla_booking::payment::PaymentError;
use rihla_core::CoreError;

#[derive(Debug)]
pub enum AppError {
    Authentication(String),
    /// Always rendered as an opaque "not authorized": office ownership must
    /// not leak through error bodies.
    Forbidden,
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Gone(String),
    Internal(anyhow::Error),
}

impl AppError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        AppError::Internal(anyhow::anyhow!("{}", err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "not authorized".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Gone(msg) => (StatusCode::GONE, msg),
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<AllocationError> for AppError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::TripNotFound(_) | AllocationError::SeatNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            // "That seat was just taken" rather than a generic failure; the
            // client should re-fetch seat state and re-select.
            AllocationError::SeatUnavailable(_) => AppError::Conflict(err.to_string()),
            AllocationError::InvalidSeatCount(_) | AllocationError::Validation(_) => {
                AppError::BadRequest(err.to_string())
            }
            AllocationError::TripClosed => AppError::Gone(err.to_string()),
            AllocationError::Store(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::NotFound(_) => AppError::NotFound(err.to_string()),
            LifecycleError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
            LifecycleError::Unauthorized => AppError::Forbidden,
            LifecycleError::Store(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::BookingNotFound(_) | PaymentError::PaymentNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            PaymentError::AlreadyPaid | PaymentError::BookingClosed(_) => {
                AppError::Conflict(err.to_string())
            }
            PaymentError::Validation(_) => AppError::BadRequest(err.to_string()),
            PaymentError::Unauthorized => AppError::Forbidden,
            PaymentError::Store(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Unauthorized => AppError::Forbidden,
            CoreError::ValidationError(msg) => AppError::BadRequest(msg),
            CoreError::InternalError(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

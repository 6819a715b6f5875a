//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client, caught before reaching the engine.
    BadRequest(String),
    /// Error surfaced by a checkout flow.
    Checkout(CheckoutError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Checkout(err) => checkout_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CheckoutError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        CheckoutError::InsufficientStock { .. } | CheckoutError::DuplicateRequest => {
            (StatusCode::CONFLICT, err.to_string())
        }
        CheckoutError::ServiceArea(_) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        CheckoutError::Gateway(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
        CheckoutError::Store(e) => {
            tracing::error!(error = %e, "store error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            )
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fulfillment::FulfillmentError;
use inventory::InventoryError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Inventory operation error.
    Inventory(InventoryError),
    /// Order fulfillment error.
    Fulfillment(FulfillmentError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(msg) => error_response(StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => error_response(StatusCode::BAD_REQUEST, msg),
            ApiError::Inventory(err) => inventory_error_response(err),
            ApiError::Fulfillment(err) => fulfillment_error_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    let body = serde_json::json!({ "error": message });
    (status, axum::Json(body)).into_response()
}

fn inventory_error_response(err: InventoryError) -> Response {
    let status = match &err {
        InventoryError::InvalidQuantity { .. } => StatusCode::BAD_REQUEST,
        InventoryError::NotFound(_) => StatusCode::NOT_FOUND,
        InventoryError::InsufficientQuantity { .. } => StatusCode::CONFLICT,
        InventoryError::Ledger(e) if e.is_persistence_fault() => StatusCode::SERVICE_UNAVAILABLE,
        InventoryError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err.to_string())
}

fn fulfillment_error_response(err: FulfillmentError) -> Response {
    match err {
        FulfillmentError::InvalidRequest { .. } => {
            error_response(StatusCode::BAD_REQUEST, err.to_string())
        }
        FulfillmentError::ProductNotFound(_) => {
            error_response(StatusCode::NOT_FOUND, err.to_string())
        }
        FulfillmentError::InsufficientStock { .. } => {
            error_response(StatusCode::CONFLICT, err.to_string())
        }
        // The reconciliation detail must reach the caller, so the partial
        // payload is serialized into the response body.
        FulfillmentError::Partial(partial) => {
            let body = serde_json::json!({
                "error": partial.to_string(),
                "partial": *partial,
            });
            (StatusCode::CONFLICT, axum::Json(body)).into_response()
        }
        FulfillmentError::Inventory(inner) => inventory_error_response(inner),
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        ApiError::Inventory(err)
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        ApiError::Fulfillment(err)
    }
}

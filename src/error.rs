//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Transfer not found: {0}")]
    TransferNotFound(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // 403 Forbidden
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone())),

            // 404 Not Found
            AppError::AccountNotFound(id) => {
                (StatusCode::NOT_FOUND, "account_not_found", Some(id.clone()))
            }
            AppError::TransferNotFound(id) => {
                (StatusCode::NOT_FOUND, "transfer_not_found", Some(id.clone()))
            }

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(domain_err) => match domain_err {
                DomainError::InvalidAccount(id) => {
                    (StatusCode::BAD_REQUEST, "invalid_account", Some(id.to_string()))
                }
                DomainError::InsufficientFunds { .. } => (
                    StatusCode::BAD_REQUEST,
                    "insufficient_funds",
                    Some(domain_err.to_string()),
                ),
                DomainError::InvalidTransferAmount(amount) => (
                    StatusCode::BAD_REQUEST,
                    "invalid_transfer_amount",
                    Some(amount.to_string()),
                ),
                DomainError::InvalidTransferRequest(id) => (
                    StatusCode::NOT_FOUND,
                    "invalid_transfer_request",
                    Some(id.to_string()),
                ),
                DomainError::DuplicateAccount(id) => {
                    (StatusCode::CONFLICT, "duplicate_account", Some(id.to_string()))
                }
                DomainError::RetriesExhausted { account_id, .. } => {
                    tracing::warn!(account_id = %account_id, "Account update contention");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "retries_exhausted",
                        Some(domain_err.to_string()),
                    )
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = self.status_and_code();

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

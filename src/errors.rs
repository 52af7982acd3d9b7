use std::time::Duration;

use axum::response::IntoResponse;
use axum::Json;
use bigdecimal::BigDecimal;
use http::StatusCode;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Stable, machine-readable error classification sent alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    AccountNotFound,
    InsufficientFunds,
    PersistenceError,
    Timeout,
    NotFound,
    AccountExists,
    UnexpectedError,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("Account not found for investor {0}")]
    AccountNotFound(String),
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        available: BigDecimal,
        requested: BigDecimal,
    },
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Purchase did not complete within {0:?}")]
    Timeout(Duration),
    #[error("{0}")]
    NotFound(String),
    #[error("Account already exists for investor {0}")]
    AccountExists(String),
    #[error("Database error: {0}")]
    Db(sqlx::Error),
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    /// Wraps a driver error raised while a purchase was being written.
    pub fn persistence(err: sqlx::Error) -> Self {
        AppError::Persistence(err.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::ValidationError,
            AppError::AccountNotFound(_) => ErrorKind::AccountNotFound,
            AppError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            AppError::Persistence(_) => ErrorKind::PersistenceError,
            AppError::Timeout(_) => ErrorKind::Timeout,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::AccountExists(_) => ErrorKind::AccountExists,
            AppError::Db(_) | AppError::Unexpected(_) => ErrorKind::UnexpectedError,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::AccountNotFound(_)
            | AppError::InsufficientFunds { .. }
            | AppError::Persistence(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AccountExists(_) => StatusCode::CONFLICT,
            AppError::Db(_) | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let message = match &self {
            AppError::Db(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        let body = json!({ "error": message, "kind": self.kind() });
        (self.status(), Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(value: sqlx::Error) -> Self {
        AppError::Db(value)
    }
}

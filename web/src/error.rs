//! Error types for web handlers.
//!
//! This module bridges between domain errors and HTTP responses,
//! implementing Axum's `IntoResponse` trait. Storage failures are logged
//! with their detail; the caller only ever sees a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use decant_core::CoreError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Wraps domain errors and provides HTTP-friendly error responses.
///
/// # Examples
///
/// ```ignore
/// async fn handler() -> Result<Json<Data>, AppError> {
///     let order = state.orders.get(id).await?
///         .ok_or_else(|| AppError::not_found("Pedido", id))?;
///     Ok(Json(order))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Create a new error with a source error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            message.into(),
            "FORBIDDEN".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} {id} no encontrado"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// The HTTP status this error renders as.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal errors
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            error: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

/// Map domain errors onto HTTP statuses.
///
/// Client errors carry their domain message through; storage failures keep
/// their detail server-side.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::Validation(_)
            | CoreError::InsufficientStock { .. }
            | CoreError::InvalidStatus(_)
            | CoreError::InvalidTransition { .. } => Self::bad_request(err.to_string()),
            CoreError::ProductNotFound(_) | CoreError::OrderNotFound(_) => Self::new(
                StatusCode::NOT_FOUND,
                err.to_string(),
                "NOT_FOUND".to_string(),
            ),
            CoreError::Forbidden(_) => Self::forbidden(err.to_string()),
            CoreError::Storage(_) => {
                Self::internal("Error interno del servidor").with_source(anyhow::anyhow!(err))
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("Error interno del servidor").with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decant_core::{OrderStatus, ProductId};

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Entrada inválida");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Entrada inválida");
    }

    #[test]
    fn test_not_found() {
        let err = AppError::not_found("Pedido", "123");
        assert_eq!(err.to_string(), "[NOT_FOUND] Pedido 123 no encontrado");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn domain_errors_map_to_client_statuses() {
        let err: AppError = CoreError::InsufficientStock {
            product_id: ProductId::new(),
            name: "Aventus".to_string(),
            available: 2,
        }
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: AppError = CoreError::ProductNotFound(ProductId::new()).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: AppError = CoreError::InvalidTransition {
            from: OrderStatus::Paid,
            to: OrderStatus::Cancelled,
        }
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn storage_detail_stays_out_of_the_message() {
        let err: AppError = CoreError::storage("connection refused at 10.0.0.2").into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("10.0.0.2"));
    }
}

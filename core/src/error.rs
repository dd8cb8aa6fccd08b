//! Domain error types for the storefront.
//!
//! Every fallible operation in this crate returns [`CoreError`]. The web
//! layer maps each variant onto an HTTP status; storage failures carry their
//! detail for server-side logs only.

use crate::types::{OrderId, OrderStatus, ProductId};
use thiserror::Error;

/// Result alias for domain operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Error kinds produced by the catalog, order, and payment components
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or incomplete input, rejected before any mutation
    #[error("{0}")]
    Validation(String),

    /// A referenced product does not exist
    #[error("Producto {0} no encontrado")]
    ProductNotFound(ProductId),

    /// A referenced order does not exist
    #[error("Pedido {0} no encontrado")]
    OrderNotFound(OrderId),

    /// The product is inactive or has fewer units than requested
    #[error("Stock insuficiente para {name}. Disponible: {available}")]
    InsufficientStock {
        /// The product that could not be reserved
        product_id: ProductId,
        /// Product name, for the customer-facing message
        name: String,
        /// Units actually available
        available: u32,
    },

    /// A status value outside the six recognized states
    #[error("Estado inválido. Estados permitidos: {}", OrderStatus::WIRE_VALUES.join(", "))]
    InvalidStatus(
        /// The rejected value
        String,
    ),

    /// A transition the state machine does not allow
    #[error("Transición de estado no permitida: {from} -> {to}")]
    InvalidTransition {
        /// Current status
        from: OrderStatus,
        /// Requested status
        to: OrderStatus,
    },

    /// Ownership or role violation
    #[error("{0}")]
    Forbidden(String),

    /// Underlying data-store failure. The message is logged server-side;
    /// callers see a generic error.
    #[error("storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Shorthand for [`CoreError::Validation`]
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for [`CoreError::Forbidden`]
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Shorthand for [`CoreError::Storage`]
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductId;

    #[test]
    fn insufficient_stock_names_product_and_availability() {
        let err = CoreError::InsufficientStock {
            product_id: ProductId::new(),
            name: "Aventus".to_string(),
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Stock insuficiente para Aventus. Disponible: 2"
        );
    }

    #[test]
    fn invalid_status_lists_valid_values() {
        let err = CoreError::InvalidStatus("shipped".to_string());
        let message = err.to_string();
        assert!(message.contains("pendiente"));
        assert!(message.contains("cancelado"));
    }
}

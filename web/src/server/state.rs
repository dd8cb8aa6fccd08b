//! Application state for the storefront HTTP server.
//!
//! Contains the shared resources every handler needs: the two document
//! stores, the payment gateway capability, and the token verifier. All
//! backends are chosen once at process start; handlers only ever see the
//! trait objects.

use crate::auth::Authenticator;
use crate::config::PaymentConfig;
use decant_core::{CatalogStore, OrderStore, PaymentGateway};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply, via `Arc`) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Product collection
    pub catalog: Arc<dyn CatalogStore>,
    /// Order collection
    pub orders: Arc<dyn OrderStore>,
    /// Payment gateway selected at process start
    pub gateway: Arc<dyn PaymentGateway>,
    /// Bearer token verifier
    pub authenticator: Arc<dyn Authenticator>,
    /// Payment configuration (mock mode flag)
    pub payment: PaymentConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        orders: Arc<dyn OrderStore>,
        gateway: Arc<dyn PaymentGateway>,
        authenticator: Arc<dyn Authenticator>,
        payment: PaymentConfig,
    ) -> Self {
        Self {
            catalog,
            orders,
            gateway,
            authenticator,
            payment,
        }
    }
}

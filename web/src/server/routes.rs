//! Router configuration for the storefront.
//!
//! Builds the complete Axum router with all endpoints.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{orders, payments, products};
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete Axum router.
///
/// Routes mirror the storefront API surface:
/// - Health checks
/// - Public catalog browsing
/// - Customer checkout, order history, and cancellation
/// - Admin catalog and order management
/// - Payment boundary pass-throughs
pub fn build_router(state: AppState) -> Router {
    let product_routes = Router::new()
        .route("/", get(products::list_products).post(products::create_product))
        .route(
            "/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/:id/stock", patch(products::update_stock))
        .route("/:id/imagen/:index", delete(products::delete_product_image));

    let order_routes = Router::new()
        .route("/", post(orders::create_order).get(orders::list_orders))
        .route("/mis-pedidos", get(orders::my_orders))
        .route("/stats/ventas", get(orders::sales_stats))
        .route("/:id", get(orders::get_order).delete(orders::cancel))
        .route("/:id/estado", patch(orders::update_status))
        .route("/:id/admin", delete(orders::admin_delete));

    let payment_routes = Router::new()
        .route("/create-preference", post(payments::create_preference))
        .route("/mock-payment", post(payments::mock_payment))
        .route("/webhook", post(payments::webhook))
        .route("/verificar/:payment_id", get(payments::verify));

    let api_routes = Router::new()
        .nest("/products", product_routes)
        .nest("/orders", order_routes)
        .nest("/payments", payment_routes);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

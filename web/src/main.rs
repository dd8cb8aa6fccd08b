//! Storefront HTTP server.
//!
//! Loads configuration, selects the storage backend and payment gateway,
//! and serves the API with graceful shutdown.

use decant_core::stores::{
    InMemoryCatalogStore, InMemoryOrderStore, PostgresCatalogStore, PostgresOrderStore,
};
use decant_core::{CatalogStore, MockPaymentGateway, OrderStore};
use decant_web::auth::StaticTokenAuthenticator;
use decant_web::{build_router, AppState, Config};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional; environment variables win.
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "decant_web=info,decant_core=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting decant storefront server");

    let config = Config::from_env();
    info!(
        host = %config.server.host,
        port = config.server.port,
        mock_payments = config.payment.mock_mode,
        "Configuration loaded"
    );

    // Select the storage backend: PostgreSQL when configured, in-memory
    // otherwise (development and tests).
    let (catalog, orders): (Arc<dyn CatalogStore>, Arc<dyn OrderStore>) =
        match &config.database.url {
            Some(url) => {
                info!("Connecting to PostgreSQL...");
                let catalog =
                    PostgresCatalogStore::connect(url, config.database.max_connections).await?;
                let orders = PostgresOrderStore::with_pool(catalog.pool().clone()).await?;
                info!("Database connected, schema ready");
                (Arc::new(catalog), Arc::new(orders))
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory stores (data is not persisted)");
                (
                    Arc::new(InMemoryCatalogStore::new()),
                    Arc::new(InMemoryOrderStore::new()),
                )
            }
        };

    // Payment gateway selection happens here, once. The mock gateway is the
    // only backend shipped with this repository.
    if !config.payment.mock_mode {
        warn!("PAYMENT_MOCK_MODE=false but no real gateway is configured; using the mock gateway");
    }
    let gateway = MockPaymentGateway::shared(config.payment.frontend_url.clone());

    let authenticator = Arc::new(StaticTokenAuthenticator::from_spec(&config.auth.tokens));

    let state = AppState::new(
        catalog,
        orders,
        gateway,
        authenticator,
        config.payment.clone(),
    );
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Graceful shutdown signal handler.
///
/// Waits for Ctrl+C (SIGINT) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            warn!("Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(_) => {
                warn!("Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

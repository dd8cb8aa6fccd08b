//! Axum HTTP server for the decant storefront.
//!
//! Thin imperative shell over `decant-core`:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         HTTP layer (this crate)         │  request parsing, auth
//! │  api/     wire DTOs + handlers          │  extractors, CORS, tracing
//! │  server/  router, state, health         │
//! ├─────────────────────────────────────────┤
//! │         decant-core                     │  checkout, status machine,
//! │  stores, payment gateway, analytics     │  stock invariants
//! └─────────────────────────────────────────┘
//! ```
//!
//! Handlers extract a verified caller, call one domain operation, and map
//! the result onto the storefront's JSON wire format (Spanish field names).
//! Domain errors become HTTP statuses in [`error::AppError`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod server;

pub use config::Config;
pub use error::AppError;
pub use server::{build_router, AppState};

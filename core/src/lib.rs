//! # Decant Core
//!
//! Domain model and business logic for the decant storefront: a catalog of
//! perfume decants, customer orders, and a mocked payment gateway.
//!
//! ## Components
//!
//! - [`types`]: value objects and entities (`Money`, `Product`, `Order`, ...)
//! - [`store`]: contracts for the two document collections; implementations
//!   in [`stores`] (in-memory and `PostgreSQL`)
//! - [`checkout`]: order placement: per-line stock reservation with a
//!   compensation log that rolls back on any failure
//! - [`status`]: the order status state machine (guarded customer
//!   cancellation, admin corrections) with stock restoration on every
//!   entry into `cancelado`
//! - [`payment`]: the payment gateway capability and the mock implementation
//! - [`analytics`]: revenue and best-seller reporting
//! - [`catalog`]: product administration
//!
//! ## Inventory correctness
//!
//! Product stock is the one resource multiple operations mutate. Every
//! mutation goes through the store's conditional operations, so:
//!
//! ```text
//! reserve:  active && stock >= n  ?  stock -= n, sales += n  :  error
//! restock:  stock += n, sales -= n (saturating)
//! ```
//!
//! The availability check and the decrement are one atomic step, so two
//! concurrent checkouts of the last units serialize, and exactly one wins.
//! Stock can never go negative.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod analytics;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod payment;
pub mod status;
pub mod store;
pub mod stores;
pub mod types;

pub use analytics::{sales_report, SalesPeriod, SalesReport};
pub use checkout::{place_order, LineRequest, PlaceOrderRequest};
pub use error::{CoreError, CoreResult};
pub use payment::{
    apply_mock_outcome, create_payment_preference, MockOutcome, MockPaymentGateway,
    PaymentGateway, PaymentPreference,
};
pub use status::{cancel_order, delete_order, parse_status, set_status};
pub use store::{CatalogStore, OrderStore, Page, Paginated};
pub use types::*;

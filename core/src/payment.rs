//! Payment gateway boundary.
//!
//! The storefront never talks to a processor directly: the checkout flow
//! receives a [`PaymentGateway`] capability chosen at process start from
//! configuration. [`MockPaymentGateway`] stands in for `MercadoPago` during
//! development and testing; a real integration would implement the same
//! trait.

use crate::error::{CoreError, CoreResult};
use crate::status::finish_cancellation;
use crate::store::{CatalogStore, OrderStore};
use crate::types::{Actor, Order, OrderId, OrderStatus};
use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// A checkout preference created at the gateway: the reference the frontend
/// redirects the customer to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentPreference {
    /// Gateway preference id
    pub id: String,
    /// Redirect URL for the live checkout
    pub init_point: String,
    /// Redirect URL for the sandbox checkout
    pub sandbox_init_point: String,
}

/// Payment gateway capability.
///
/// Abstraction over processors like `MercadoPago` and Flow. Implementations
/// are injected at process start; business logic never selects a backend
/// itself.
pub trait PaymentGateway: Send + Sync {
    /// Creates a checkout preference for an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway rejects the request.
    fn create_preference(
        &self,
        order: &Order,
    ) -> Pin<Box<dyn Future<Output = CoreResult<PaymentPreference>> + Send>>;
}

/// Mock payment gateway (always succeeds, for development).
#[derive(Clone, Debug)]
pub struct MockPaymentGateway {
    frontend_url: String,
}

impl MockPaymentGateway {
    /// Creates a mock gateway whose redirect URLs point at `frontend_url`.
    #[must_use]
    pub const fn new(frontend_url: String) -> Self {
        Self { frontend_url }
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(frontend_url: String) -> Arc<dyn PaymentGateway> {
        Arc::new(Self::new(frontend_url))
    }
}

impl PaymentGateway for MockPaymentGateway {
    fn create_preference(
        &self,
        order: &Order,
    ) -> Pin<Box<dyn Future<Output = CoreResult<PaymentPreference>> + Send>> {
        let order_id = order.id;
        let frontend_url = self.frontend_url.clone();
        Box::pin(async move {
            let preference_id = format!("mock-{}", Uuid::new_v4());
            let redirect =
                format!("{frontend_url}/pago/mock?preference={preference_id}&order={order_id}");

            info!(
                order_id = %order_id,
                preference_id = %preference_id,
                "mock payment preference created"
            );

            Ok(PaymentPreference {
                id: preference_id,
                init_point: redirect.clone(),
                sandbox_init_point: redirect,
            })
        })
    }
}

/// Creates a payment preference for an order.
///
/// Only the order's owner may pay for it, and only while it is still
/// `pendiente`.
///
/// # Errors
///
/// - [`CoreError::OrderNotFound`] for an unknown order
/// - [`CoreError::Forbidden`] when the actor does not own the order
/// - [`CoreError::Validation`] when the order is no longer payable
/// - Whatever the gateway returns on failure
pub async fn create_payment_preference(
    orders: &dyn OrderStore,
    gateway: &dyn PaymentGateway,
    order_id: OrderId,
    actor: Actor,
) -> CoreResult<PaymentPreference> {
    let order = orders
        .get(order_id)
        .await?
        .ok_or(CoreError::OrderNotFound(order_id))?;

    if order.user_id != actor.user_id {
        return Err(CoreError::forbidden(
            "No tienes permiso para pagar este pedido",
        ));
    }

    if order.status != OrderStatus::Pending {
        return Err(CoreError::validation(
            "Este pedido ya no está disponible para pago",
        ));
    }

    gateway.create_preference(&order).await
}

/// Simulated gateway outcome for the mock payment endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MockOutcome {
    /// The gateway approved the charge
    Approved,
    /// The gateway rejected the charge
    Rejected,
    /// The gateway left the charge pending
    Pending,
}

impl MockOutcome {
    /// Maps a simulated outcome token. Anything unrecognized counts as
    /// `pending`, mirroring the gateway's webhook behavior.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        match value {
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        }
    }

    /// The order status this outcome maps to.
    #[must_use]
    pub const fn order_status(self) -> OrderStatus {
        match self {
            Self::Approved => OrderStatus::Paid,
            Self::Rejected => OrderStatus::Cancelled,
            Self::Pending => OrderStatus::Pending,
        }
    }
}

/// Applies a simulated payment outcome to an order: maps the outcome to a
/// status, records a synthetic payment reference, and persists.
///
/// A rejected outcome goes through the same cancellation path as an explicit
/// cancel, so stock is restored.
///
/// # Errors
///
/// - [`CoreError::OrderNotFound`] for an unknown order
/// - [`CoreError::Storage`] if the data store fails
pub async fn apply_mock_outcome(
    catalog: &dyn CatalogStore,
    orders: &dyn OrderStore,
    order_id: OrderId,
    outcome: MockOutcome,
) -> CoreResult<Order> {
    let mut order = orders
        .get(order_id)
        .await?
        .ok_or(CoreError::OrderNotFound(order_id))?;

    order.payment_ref = Some(format!("mock-payment-{}", Uuid::new_v4()));

    let target = outcome.order_status();
    info!(order_id = %order_id, outcome = ?outcome, status = %target, "mock payment applied");

    if target == OrderStatus::Cancelled && order.status != OrderStatus::Cancelled {
        return finish_cancellation(catalog, orders, order).await;
    }

    order.status = target;
    order.updated_at = Utc::now();
    orders.update(order.clone()).await?;
    Ok(order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::checkout::{place_order, LineRequest, PlaceOrderRequest};
    use crate::stores::memory::{InMemoryCatalogStore, InMemoryOrderStore};
    use crate::types::{
        Category, Gender, Money, PaymentMethod, Product, ProductId, ShippingAddress, UserId,
        Volume,
    };

    fn product(stock: u32) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(),
            name: "Bergamota".to_string(),
            brand: "Casa".to_string(),
            description: String::new(),
            volume: Volume::Ml5,
            price: Money::from_cents(4_500),
            stock,
            images: vec![],
            category: Category::Primavera,
            gender: Gender::Unisex,
            active: true,
            sales: 0,
            created_at: now,
            updated_at: now,
        }
    }

    async fn placed(
        catalog: &InMemoryCatalogStore,
        orders: &InMemoryOrderStore,
        user: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Order {
        place_order(
            catalog,
            orders,
            user,
            PlaceOrderRequest {
                items: vec![LineRequest { product_id, quantity }],
                shipping_address: ShippingAddress {
                    street: "Calle 1".to_string(),
                    city: "Santiago".to_string(),
                    region: "RM".to_string(),
                    postal_code: "8320000".to_string(),
                },
                payment_method: PaymentMethod::Mercadopago,
                customer_notes: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn mock_gateway_produces_mock_preferences() {
        let catalog = InMemoryCatalogStore::new();
        let orders = InMemoryOrderStore::new();
        let p = product(5);
        catalog.insert(p.clone()).await.unwrap();
        let user = UserId::new();
        let order = placed(&catalog, &orders, user, p.id, 1).await;

        let gateway = MockPaymentGateway::new("http://localhost:5173".to_string());
        let preference =
            create_payment_preference(&orders, &gateway, order.id, Actor::customer(user))
                .await
                .unwrap();

        assert!(preference.id.starts_with("mock-"));
        assert!(preference.init_point.contains(&order.id.to_string()));
        assert_eq!(preference.init_point, preference.sandbox_init_point);
    }

    #[tokio::test]
    async fn only_the_owner_may_create_a_preference() {
        let catalog = InMemoryCatalogStore::new();
        let orders = InMemoryOrderStore::new();
        let p = product(5);
        catalog.insert(p.clone()).await.unwrap();
        let order = placed(&catalog, &orders, UserId::new(), p.id, 1).await;

        let gateway = MockPaymentGateway::new("http://localhost:5173".to_string());
        let err = create_payment_preference(
            &orders,
            &gateway,
            order.id,
            Actor::customer(UserId::new()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[tokio::test]
    async fn paid_orders_are_not_payable_again() {
        let catalog = InMemoryCatalogStore::new();
        let orders = InMemoryOrderStore::new();
        let p = product(5);
        catalog.insert(p.clone()).await.unwrap();
        let user = UserId::new();
        let order = placed(&catalog, &orders, user, p.id, 1).await;

        apply_mock_outcome(&catalog, &orders, order.id, MockOutcome::Approved)
            .await
            .unwrap();

        let gateway = MockPaymentGateway::new("http://localhost:5173".to_string());
        let err = create_payment_preference(&orders, &gateway, order.id, Actor::customer(user))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn approved_outcome_marks_paid_and_sets_reference() {
        let catalog = InMemoryCatalogStore::new();
        let orders = InMemoryOrderStore::new();
        let p = product(5);
        catalog.insert(p.clone()).await.unwrap();
        let order = placed(&catalog, &orders, UserId::new(), p.id, 2).await;

        let updated = apply_mock_outcome(&catalog, &orders, order.id, MockOutcome::Approved)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Paid);
        assert!(updated.payment_ref.unwrap().starts_with("mock-payment-"));
        // A successful payment leaves the reservation in place.
        assert_eq!(catalog.get(p.id).await.unwrap().unwrap().stock, 3);
    }

    #[tokio::test]
    async fn rejected_outcome_cancels_and_restores_stock() {
        let catalog = InMemoryCatalogStore::new();
        let orders = InMemoryOrderStore::new();
        let p = product(5);
        catalog.insert(p.clone()).await.unwrap();
        let order = placed(&catalog, &orders, UserId::new(), p.id, 2).await;
        assert_eq!(catalog.get(p.id).await.unwrap().unwrap().stock, 3);

        let updated = apply_mock_outcome(&catalog, &orders, order.id, MockOutcome::Rejected)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Cancelled);
        assert!(updated.payment_ref.is_some());
        assert_eq!(catalog.get(p.id).await.unwrap().unwrap().stock, 5);
    }

    #[tokio::test]
    async fn unknown_outcome_tokens_leave_the_order_pending() {
        let catalog = InMemoryCatalogStore::new();
        let orders = InMemoryOrderStore::new();
        let p = product(5);
        catalog.insert(p.clone()).await.unwrap();
        let order = placed(&catalog, &orders, UserId::new(), p.id, 1).await;

        let outcome = MockOutcome::from_wire("whatever");
        assert_eq!(outcome, MockOutcome::Pending);

        let updated = apply_mock_outcome(&catalog, &orders, order.id, outcome)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Pending);
        assert!(updated.payment_ref.is_some());
    }
}

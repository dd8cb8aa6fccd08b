//! Order placement.
//!
//! Validates a cart, reserves stock line by line, and creates the order.
//! Each successful reservation is persisted before the next line is
//! attempted; a compensation log records every reservation taken so far so
//! that any later failure can replay the inverse operations before the error
//! returns. Without it, a failure on line 3 of 5 would leave lines 1-2
//! decremented with no order to account for them.

use crate::error::{CoreError, CoreResult};
use crate::store::{CatalogStore, OrderStore};
use crate::types::{
    LineItem, Money, Order, OrderId, OrderStatus, PaymentMethod, ProductId, ShippingAddress,
    UserId, MAX_CUSTOMER_NOTES_LEN,
};
use chrono::Utc;
use tracing::{error, info, warn};

/// One requested product-quantity pair, in the order the customer supplied it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineRequest {
    /// The product to buy
    pub product_id: ProductId,
    /// Units requested (must be at least 1)
    pub quantity: u32,
}

/// A checkout request.
#[derive(Clone, Debug)]
pub struct PlaceOrderRequest {
    /// Requested lines; processed in this order
    pub items: Vec<LineRequest>,
    /// Destination address (all fields required)
    pub shipping_address: ShippingAddress,
    /// Payment processor the customer picked
    pub payment_method: PaymentMethod,
    /// Optional customer notes
    pub customer_notes: Option<String>,
}

/// Places an order: validates the request, reserves stock for each line in
/// the caller-supplied order, then creates the order in status `pendiente`.
///
/// Stock reservations are persisted per line. If anything fails after the
/// first reservation (a later line short on stock, arithmetic overflow, or
/// the order insert itself), every reservation taken so far is rolled back
/// (in reverse order) before the error is returned.
///
/// There is no idempotency key: replaying the same request places a second
/// order and reserves stock again.
///
/// # Errors
///
/// - [`CoreError::Validation`] for an empty cart, a zero quantity, an
///   incomplete address, or over-long notes (checked before any mutation)
/// - [`CoreError::ProductNotFound`] naming the first missing product
/// - [`CoreError::InsufficientStock`] naming the product and its available
///   units
/// - [`CoreError::Storage`] if the data store fails
pub async fn place_order(
    catalog: &dyn CatalogStore,
    orders: &dyn OrderStore,
    user_id: UserId,
    request: PlaceOrderRequest,
) -> CoreResult<Order> {
    validate(&request)?;

    // Compensation log: reservations already persisted, in application order.
    let mut reserved: Vec<(ProductId, u32)> = Vec::with_capacity(request.items.len());
    let mut items: Vec<LineItem> = Vec::with_capacity(request.items.len());
    let mut total = Money::ZERO;

    for line in &request.items {
        let product = match catalog.reserve(line.product_id, line.quantity).await {
            Ok(product) => product,
            Err(err) => {
                compensate(catalog, &reserved).await;
                return Err(err);
            }
        };
        reserved.push((line.product_id, line.quantity));

        // Snapshot price/name/volume as they were at this moment; the line
        // must stay accurate even if the product later changes or disappears.
        let Some(subtotal) = product.price.checked_multiply(line.quantity) else {
            compensate(catalog, &reserved).await;
            return Err(CoreError::validation("El subtotal excede el monto máximo"));
        };
        let Some(next_total) = total.checked_add(subtotal) else {
            compensate(catalog, &reserved).await;
            return Err(CoreError::validation("El total excede el monto máximo"));
        };
        total = next_total;

        items.push(LineItem {
            product_id: product.id,
            name: product.name,
            price: product.price,
            volume: product.volume,
            quantity: line.quantity,
            subtotal,
        });
    }

    let now = Utc::now();
    let order = Order {
        id: OrderId::new(),
        user_id,
        items,
        total,
        status: OrderStatus::Pending,
        payment_method: request.payment_method,
        payment_ref: None,
        shipping_address: request.shipping_address,
        customer_notes: request.customer_notes,
        created_at: now,
        updated_at: now,
    };

    if let Err(err) = orders.insert(order.clone()).await {
        error!(order_id = %order.id, error = %err, "order insert failed, rolling back reservations");
        compensate(catalog, &reserved).await;
        return Err(err);
    }

    info!(
        order_id = %order.id,
        user_id = %user_id,
        lines = order.items.len(),
        total = %order.total,
        "order placed"
    );
    Ok(order)
}

fn validate(request: &PlaceOrderRequest) -> CoreResult<()> {
    if request.items.is_empty() {
        return Err(CoreError::validation(
            "El pedido debe contener al menos un producto",
        ));
    }
    if request.items.iter().any(|line| line.quantity == 0) {
        return Err(CoreError::validation("La cantidad debe ser al menos 1"));
    }
    if !request.shipping_address.is_complete() {
        return Err(CoreError::validation("La dirección de envío está incompleta"));
    }
    if request
        .customer_notes
        .as_ref()
        .is_some_and(|notes| notes.chars().count() > MAX_CUSTOMER_NOTES_LEN)
    {
        return Err(CoreError::validation(
            "Las notas no pueden exceder 500 caracteres",
        ));
    }
    Ok(())
}

/// Replays the inverse of every logged reservation, newest first. A restock
/// that fails is logged and skipped: the remaining lines still get their
/// stock back.
async fn compensate(catalog: &dyn CatalogStore, reserved: &[(ProductId, u32)]) {
    for (product_id, quantity) in reserved.iter().rev() {
        match catalog.restock(*product_id, *quantity).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(product_id = %product_id, "compensation skipped: product no longer exists");
            }
            Err(err) => {
                error!(
                    product_id = %product_id,
                    quantity,
                    error = %err,
                    "compensation failed; stock left decremented"
                );
            }
        }
    }
}

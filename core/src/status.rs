//! Order status transitions.
//!
//! Two distinct operations with distinct permission and transition rules:
//! customers cancel their own *pending* orders; admins may correct order
//! state for operational reasons. Both funnel every entry into `cancelado`
//! through the same stock restoration, so no path can strand reserved units.
//!
//! `cancelado` is terminal: nothing transitions out of it.

use crate::error::{CoreError, CoreResult};
use crate::store::{CatalogStore, OrderStore};
use crate::types::{Actor, Order, OrderId, OrderStatus};
use chrono::Utc;
use tracing::{info, warn};

/// Parses a wire status value, failing with [`CoreError::InvalidStatus`]
/// (which lists the six recognized values) on anything else.
///
/// # Errors
///
/// Returns [`CoreError::InvalidStatus`] for an unrecognized value.
pub fn parse_status(value: &str) -> CoreResult<OrderStatus> {
    OrderStatus::parse(value).ok_or_else(|| CoreError::InvalidStatus(value.to_string()))
}

/// Whether the admin status-update operation may move an order from `from`
/// to `to`.
///
/// Admins move freely among the non-cancelled states and may cancel from any
/// of them; nothing leaves `cancelado`. Setting the current status again is
/// a permitted no-op.
#[must_use]
pub const fn admin_transition_allowed(from: OrderStatus, to: OrderStatus) -> bool {
    match from {
        OrderStatus::Cancelled => matches!(to, OrderStatus::Cancelled),
        _ => true,
    }
}

/// Customer-facing cancellation.
///
/// Only the order's owner or an admin may cancel, and only while the order
/// is still `pendiente`. Restores stock for every line (skipping lines whose
/// product has since been deleted), then marks the order `cancelado`.
///
/// # Errors
///
/// - [`CoreError::OrderNotFound`] for an unknown order
/// - [`CoreError::Forbidden`] when the actor is neither owner nor admin
/// - [`CoreError::InvalidTransition`] when the order is not `pendiente`
/// - [`CoreError::Storage`] if the data store fails
pub async fn cancel_order(
    catalog: &dyn CatalogStore,
    orders: &dyn OrderStore,
    order_id: OrderId,
    actor: Actor,
) -> CoreResult<Order> {
    let order = orders
        .get(order_id)
        .await?
        .ok_or(CoreError::OrderNotFound(order_id))?;

    if !actor.may_access(&order) {
        return Err(CoreError::forbidden(
            "No tienes permiso para cancelar este pedido",
        ));
    }

    if order.status != OrderStatus::Pending {
        return Err(CoreError::InvalidTransition {
            from: order.status,
            to: OrderStatus::Cancelled,
        });
    }

    finish_cancellation(catalog, orders, order).await
}

/// Admin status update.
///
/// # Errors
///
/// - [`CoreError::Forbidden`] when the actor is not an admin
/// - [`CoreError::OrderNotFound`] for an unknown order
/// - [`CoreError::InvalidTransition`] for a move the admin table rejects
///   (anything out of `cancelado`)
/// - [`CoreError::Storage`] if the data store fails
pub async fn set_status(
    catalog: &dyn CatalogStore,
    orders: &dyn OrderStore,
    order_id: OrderId,
    new_status: OrderStatus,
    actor: Actor,
) -> CoreResult<Order> {
    if !actor.is_admin() {
        return Err(CoreError::forbidden(
            "Solo un administrador puede actualizar el estado",
        ));
    }

    let mut order = orders
        .get(order_id)
        .await?
        .ok_or(CoreError::OrderNotFound(order_id))?;

    if !admin_transition_allowed(order.status, new_status) {
        return Err(CoreError::InvalidTransition {
            from: order.status,
            to: new_status,
        });
    }

    // Entering cancelado returns the reserved units, whoever asks for it.
    if new_status == OrderStatus::Cancelled && order.status != OrderStatus::Cancelled {
        return finish_cancellation(catalog, orders, order).await;
    }

    let previous = order.status;
    order.status = new_status;
    order.updated_at = Utc::now();
    orders.update(order.clone()).await?;

    info!(order_id = %order.id, from = %previous, to = %new_status, "order status updated");
    Ok(order)
}

/// Marks an order `cancelado` after restoring its stock.
///
/// Shared by the customer cancel, the admin cancel, and the rejected mock
/// payment, so stock restoration cannot be bypassed.
pub(crate) async fn finish_cancellation(
    catalog: &dyn CatalogStore,
    orders: &dyn OrderStore,
    mut order: Order,
) -> CoreResult<Order> {
    restore_stock(catalog, &order).await?;

    let previous = order.status;
    order.status = OrderStatus::Cancelled;
    order.updated_at = Utc::now();
    orders.update(order.clone()).await?;

    info!(order_id = %order.id, from = %previous, "order cancelled, stock restored");
    Ok(order)
}

/// Admin hard delete.
///
/// Only orders already in a terminal status (`cancelado` or `entregado`) may
/// be removed: deleting a live order would orphan the stock it reserved.
///
/// # Errors
///
/// - [`CoreError::Forbidden`] when the actor is not an admin
/// - [`CoreError::OrderNotFound`] for an unknown order
/// - [`CoreError::Validation`] when the order is not in a terminal status
/// - [`CoreError::Storage`] if the data store fails
pub async fn delete_order(
    orders: &dyn OrderStore,
    order_id: OrderId,
    actor: Actor,
) -> CoreResult<()> {
    if !actor.is_admin() {
        return Err(CoreError::forbidden(
            "Solo un administrador puede eliminar pedidos",
        ));
    }

    let order = orders
        .get(order_id)
        .await?
        .ok_or(CoreError::OrderNotFound(order_id))?;

    if !order.status.is_terminal() {
        return Err(CoreError::validation(
            "Solo se pueden eliminar pedidos cancelados o entregados",
        ));
    }

    orders.delete(order_id).await?;
    info!(order_id = %order_id, status = %order.status, "order deleted");
    Ok(())
}

/// Restores stock for every line item. Lines whose product no longer exists
/// are skipped rather than failing the whole cancellation.
async fn restore_stock(catalog: &dyn CatalogStore, order: &Order) -> CoreResult<()> {
    for item in &order.items {
        let existed = catalog.restock(item.product_id, item.quantity).await?;
        if !existed {
            warn!(
                order_id = %order.id,
                product_id = %item.product_id,
                "stock restoration skipped: product deleted"
            );
        }
    }
    Ok(())
}

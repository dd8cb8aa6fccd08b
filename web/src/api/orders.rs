//! Order endpoints.
//!
//! - POST /api/orders - place an order (authenticated)
//! - GET /api/orders/mis-pedidos - caller's orders, newest first
//! - GET /api/orders/:id - order detail (owner or admin)
//! - DELETE /api/orders/:id - customer cancellation
//! - GET /api/orders - admin listing with filters and aggregate stats
//! - PATCH /api/orders/:id/estado - admin status update
//! - DELETE /api/orders/:id/admin - admin hard delete (terminal orders only)
//! - GET /api/orders/stats/ventas - admin sales report

use super::{page_from_query, PaginationDto, ADMIN_ORDERS_PAGE_LIMIT, MY_ORDERS_PAGE_LIMIT};
use crate::auth::{CurrentUser, RequireAdmin};
use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use decant_core::store::{OrderFilter, OrderStats};
use decant_core::{
    cancel_order, delete_order, parse_status, place_order, sales_report, set_status, LineItem,
    LineRequest, Money, Order, OrderId, OrderStatus, OrderStore, PaymentMethod,
    PlaceOrderRequest, ProductId, SalesPeriod, SalesReport, ShippingAddress, Volume,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Line item as the API renders it.
#[derive(Debug, Serialize)]
pub struct LineItemDto {
    /// Product reference
    #[serde(rename = "productId")]
    pub product_id: Uuid,
    /// Name snapshot
    #[serde(rename = "nombre")]
    pub name: String,
    /// Unit price snapshot in cents
    #[serde(rename = "precio")]
    pub price: Money,
    /// Size snapshot
    #[serde(rename = "volumen")]
    pub volume: Volume,
    /// Units ordered
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    /// Line subtotal in cents
    pub subtotal: Money,
}

impl From<LineItem> for LineItemDto {
    fn from(item: LineItem) -> Self {
        Self {
            product_id: *item.product_id.as_uuid(),
            name: item.name,
            price: item.price,
            volume: item.volume,
            quantity: item.quantity,
            subtotal: item.subtotal,
        }
    }
}

/// Shipping address as the API renders and receives it.
#[derive(Debug, Deserialize, Serialize)]
pub struct AddressDto {
    /// Street and number
    #[serde(rename = "calle")]
    pub street: String,
    /// City
    #[serde(rename = "ciudad")]
    pub city: String,
    /// Region or state
    pub region: String,
    /// Postal code
    #[serde(rename = "codigoPostal")]
    pub postal_code: String,
}

impl From<AddressDto> for ShippingAddress {
    fn from(dto: AddressDto) -> Self {
        Self {
            street: dto.street,
            city: dto.city,
            region: dto.region,
            postal_code: dto.postal_code,
        }
    }
}

impl From<ShippingAddress> for AddressDto {
    fn from(address: ShippingAddress) -> Self {
        Self {
            street: address.street,
            city: address.city,
            region: address.region,
            postal_code: address.postal_code,
        }
    }
}

/// Order as the API renders it.
#[derive(Debug, Serialize)]
pub struct OrderDto {
    /// Order id
    pub id: Uuid,
    /// Owning user
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    /// Line items
    pub items: Vec<LineItemDto>,
    /// Order total in cents
    pub total: Money,
    /// Current status
    #[serde(rename = "estado")]
    pub status: OrderStatus,
    /// Payment processor
    #[serde(rename = "metodoPago")]
    pub payment_method: PaymentMethod,
    /// Gateway payment reference, once known
    #[serde(rename = "pagoId")]
    pub payment_ref: Option<String>,
    /// Shipping address
    #[serde(rename = "direccionEnvio")]
    pub shipping_address: AddressDto,
    /// Customer notes
    #[serde(rename = "notasCliente")]
    pub customer_notes: Option<String>,
    /// Placement time
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Last modification time
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        Self {
            id: *order.id.as_uuid(),
            user_id: *order.user_id.as_uuid(),
            items: order.items.into_iter().map(LineItemDto::from).collect(),
            total: order.total,
            status: order.status,
            payment_method: order.payment_method,
            payment_ref: order.payment_ref,
            shipping_address: order.shipping_address.into(),
            customer_notes: order.customer_notes,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// One requested line in a checkout.
#[derive(Debug, Deserialize)]
pub struct LineRequestBody {
    /// Product to buy
    #[serde(rename = "productId")]
    pub product_id: Uuid,
    /// Units requested
    #[serde(rename = "cantidad")]
    pub quantity: u32,
}

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct CreateOrderBody {
    /// Requested lines, processed in this order
    pub items: Vec<LineRequestBody>,
    /// Destination address
    #[serde(rename = "direccionEnvio")]
    pub shipping_address: AddressDto,
    /// Payment processor (defaults to mercadopago)
    #[serde(rename = "metodoPago")]
    pub payment_method: Option<String>,
    /// Optional customer notes
    #[serde(rename = "notasCliente")]
    pub customer_notes: Option<String>,
}

/// Response wrapping a single order.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    /// Always true on success
    pub success: bool,
    /// Optional human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The order
    pub data: OrderDto,
}

/// Response for order listings.
#[derive(Debug, Serialize)]
pub struct ListOrdersResponse {
    /// Always true on success
    pub success: bool,
    /// Orders on this page
    pub data: Vec<OrderDto>,
    /// Pagination envelope
    pub pagination: PaginationDto,
    /// Aggregate stats over the filtered set (admin listing only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<OrderStats>,
}

/// Query parameters for listing the caller's orders.
#[derive(Debug, Deserialize)]
pub struct MyOrdersQuery {
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
}

/// Query parameters for the admin listing.
#[derive(Debug, Deserialize)]
pub struct AdminOrdersQuery {
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
    /// Filter by status
    #[serde(rename = "estado")]
    pub status: Option<String>,
    /// Orders created at or after this instant (RFC 3339)
    #[serde(rename = "fechaDesde")]
    pub date_from: Option<DateTime<Utc>>,
    /// Orders created at or before this instant (RFC 3339)
    #[serde(rename = "fechaHasta")]
    pub date_to: Option<DateTime<Utc>>,
}

/// Body for the admin status update.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    /// New status (one of the six wire values)
    #[serde(rename = "estado")]
    pub status: Option<String>,
}

/// Response for the admin status update.
#[derive(Debug, Serialize)]
pub struct UpdateStatusResponse {
    /// Always true on success
    pub success: bool,
    /// Human-readable message
    pub message: String,
    /// Updated order summary
    pub data: StatusData,
}

/// Status summary inside [`UpdateStatusResponse`].
#[derive(Debug, Serialize)]
pub struct StatusData {
    /// Order id
    pub id: Uuid,
    /// Status after the update
    #[serde(rename = "estado")]
    pub status: OrderStatus,
    /// When the order was last modified
    #[serde(rename = "fechaActualizacion")]
    pub updated_at: DateTime<Utc>,
}

/// Response for cancellations and deletions.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Always true on success
    pub success: bool,
    /// Human-readable message
    pub message: String,
}

/// Query parameters for the sales report.
#[derive(Debug, Deserialize)]
pub struct SalesStatsQuery {
    /// Window: `dia`, `semana`, `mes`, `año` (default `mes`)
    #[serde(rename = "periodo")]
    pub period: Option<String>,
}

/// Response for the sales report.
#[derive(Debug, Serialize)]
pub struct SalesStatsResponse {
    /// Always true on success
    pub success: bool,
    /// The report
    pub data: SalesReport,
}

// ============================================================================
// Handlers
// ============================================================================

/// Place an order.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:5000/api/orders \
///   -H "Authorization: Bearer <token>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "items": [{"productId": "...", "cantidad": 2}],
///     "direccionEnvio": {
///       "calle": "Av. Providencia 1234",
///       "ciudad": "Santiago",
///       "region": "RM",
///       "codigoPostal": "7500000"
///     },
///     "metodoPago": "mercadopago"
///   }'
/// ```
pub async fn create_order(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<CreateOrderBody>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let payment_method = match body.payment_method.as_deref() {
        None => PaymentMethod::default(),
        Some(value) => PaymentMethod::parse(value)
            .ok_or_else(|| AppError::bad_request(format!("Método de pago inválido: {value}")))?,
    };

    let request = PlaceOrderRequest {
        items: body
            .items
            .into_iter()
            .map(|line| LineRequest {
                product_id: ProductId::from_uuid(line.product_id),
                quantity: line.quantity,
            })
            .collect(),
        shipping_address: body.shipping_address.into(),
        payment_method,
        customer_notes: body.customer_notes,
    };

    let order = place_order(
        state.catalog.as_ref(),
        state.orders.as_ref(),
        user.0.user_id,
        request,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            success: true,
            message: Some("Pedido creado exitosamente".to_string()),
            data: order.into(),
        }),
    ))
}

/// The caller's orders, newest first.
pub async fn my_orders(
    user: CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<MyOrdersQuery>,
) -> Result<Json<ListOrdersResponse>, AppError> {
    let page = page_from_query(query.page, query.limit, MY_ORDERS_PAGE_LIMIT);
    let result = state.orders.list_for_user(user.0.user_id, page).await?;
    let pagination = PaginationDto::from_page(&result);

    Ok(Json(ListOrdersResponse {
        success: true,
        data: result.items.into_iter().map(OrderDto::from).collect(),
        pagination,
        stats: None,
    }))
}

/// Order detail. Only the owner or an admin may read it.
pub async fn get_order(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    let order = state
        .orders
        .get(OrderId::from_uuid(id))
        .await?
        .ok_or_else(|| AppError::not_found("Pedido", id))?;

    if !user.actor().may_access(&order) {
        return Err(AppError::forbidden("No tienes permiso para ver este pedido"));
    }

    Ok(Json(OrderResponse {
        success: true,
        message: None,
        data: order.into(),
    }))
}

/// Admin listing: filtered, paginated, with aggregate stats over the
/// filtered set.
pub async fn list_orders(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<AdminOrdersQuery>,
) -> Result<Json<ListOrdersResponse>, AppError> {
    let filter = OrderFilter {
        status: query.status.as_deref().map(parse_status).transpose()?,
        date_from: query.date_from,
        date_to: query.date_to,
    };

    let page = page_from_query(query.page, query.limit, ADMIN_ORDERS_PAGE_LIMIT);
    let (result, stats) = state.orders.list(&filter, page).await?;
    let pagination = PaginationDto::from_page(&result);

    Ok(Json(ListOrdersResponse {
        success: true,
        data: result.items.into_iter().map(OrderDto::from).collect(),
        pagination,
        stats: Some(stats),
    }))
}

/// Admin status update.
pub async fn update_status(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<UpdateStatusResponse>, AppError> {
    let status = parse_status(body.status.as_deref().unwrap_or(""))?;

    let order = set_status(
        state.catalog.as_ref(),
        state.orders.as_ref(),
        OrderId::from_uuid(id),
        status,
        admin.actor(),
    )
    .await?;

    Ok(Json(UpdateStatusResponse {
        success: true,
        message: "Estado del pedido actualizado exitosamente".to_string(),
        data: StatusData {
            id: *order.id.as_uuid(),
            status: order.status,
            updated_at: order.updated_at,
        },
    }))
}

/// Customer cancellation: only the owner (or an admin) and only while the
/// order is still `pendiente`. Restores stock.
pub async fn cancel(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    cancel_order(
        state.catalog.as_ref(),
        state.orders.as_ref(),
        OrderId::from_uuid(id),
        user.actor(),
    )
    .await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Pedido cancelado exitosamente".to_string(),
    }))
}

/// Admin hard delete; only terminal orders may be removed.
pub async fn admin_delete(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    delete_order(state.orders.as_ref(), OrderId::from_uuid(id), admin.actor()).await?;

    Ok(Json(MessageResponse {
        success: true,
        message: "Pedido eliminado exitosamente".to_string(),
    }))
}

/// Admin sales report over a sliding window (default: last month).
pub async fn sales_stats(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<SalesStatsQuery>,
) -> Result<Json<SalesStatsResponse>, AppError> {
    let period = query
        .period
        .as_deref()
        .map_or_else(SalesPeriod::default, SalesPeriod::from_wire);

    let report = sales_report(state.orders.as_ref(), Utc::now(), period).await?;
    Ok(Json(SalesStatsResponse {
        success: true,
        data: report,
    }))
}

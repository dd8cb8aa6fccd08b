//! Product catalog endpoints.
//!
//! Public browse surface plus the admin CRUD and stock adjustment:
//! - GET /api/products - list active products with filters (public)
//! - GET /api/products/:id - product detail (public)
//! - POST /api/products - create (admin)
//! - PUT /api/products/:id - update (admin)
//! - DELETE /api/products/:id - delete (admin)
//! - PATCH /api/products/:id/stock - stock adjustment (admin)
//! - DELETE /api/products/:id/imagen/:index - remove one image (admin)

use super::{page_from_query, PaginationDto, PRODUCTS_PAGE_LIMIT};
use crate::auth::RequireAdmin;
use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use decant_core::catalog::{self, NewProduct, ProductPatch};
use decant_core::store::{ProductFilter, ProductSort, StockOperation};
use decant_core::{
    Category, CatalogStore, Gender, Money, Product, ProductId, Volume,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Product as the API renders it.
#[derive(Debug, Serialize)]
pub struct ProductDto {
    /// Product id
    pub id: Uuid,
    /// Display name
    #[serde(rename = "nombre")]
    pub name: String,
    /// Fragrance house
    #[serde(rename = "marca")]
    pub brand: String,
    /// Marketing description
    #[serde(rename = "descripcion")]
    pub description: String,
    /// Decant size
    #[serde(rename = "volumen")]
    pub volume: Volume,
    /// Unit price in cents
    #[serde(rename = "precio")]
    pub price: Money,
    /// Units on hand
    pub stock: u32,
    /// Image URL paths
    #[serde(rename = "imagenes")]
    pub images: Vec<String>,
    /// Seasonal category
    #[serde(rename = "categoria")]
    pub category: Category,
    /// Target gender
    #[serde(rename = "genero")]
    pub gender: Gender,
    /// Whether the product is purchasable
    #[serde(rename = "activo")]
    pub active: bool,
    /// Cumulative units sold
    #[serde(rename = "ventas")]
    pub sales: u32,
    /// Creation time
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Last modification time
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        Self {
            id: *p.id.as_uuid(),
            name: p.name,
            brand: p.brand,
            description: p.description,
            volume: p.volume,
            price: p.price,
            stock: p.stock,
            images: p.images,
            category: p.category,
            gender: p.gender,
            active: p.active,
            sales: p.sales,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ListProductsQuery {
    /// Page number (1-based)
    pub page: Option<u32>,
    /// Page size
    pub limit: Option<u32>,
    /// Filter by seasonal category
    #[serde(rename = "categoria")]
    pub category: Option<String>,
    /// Filter by target gender
    #[serde(rename = "genero")]
    pub gender: Option<String>,
    /// Minimum price in cents
    #[serde(rename = "precioMin")]
    pub price_min: Option<u64>,
    /// Maximum price in cents
    #[serde(rename = "precioMax")]
    pub price_max: Option<u64>,
    /// Text search over name, brand, and description
    #[serde(rename = "buscar")]
    pub search: Option<String>,
    /// Sort: `precio-asc`, `precio-desc`, `nombre`, `mas-vendidos`
    #[serde(rename = "ordenar")]
    pub sort: Option<String>,
}

/// Response for the product listing.
#[derive(Debug, Serialize)]
pub struct ListProductsResponse {
    /// Always true on success
    pub success: bool,
    /// Products on this page
    pub data: Vec<ProductDto>,
    /// Pagination envelope
    pub pagination: PaginationDto,
}

/// Response wrapping a single product.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    /// Always true on success
    pub success: bool,
    /// Optional human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The product
    pub data: ProductDto,
}

/// Request to create a product.
#[derive(Debug, Deserialize)]
pub struct CreateProductBody {
    /// Display name
    #[serde(rename = "nombre")]
    pub name: String,
    /// Fragrance house
    #[serde(rename = "marca")]
    pub brand: String,
    /// Marketing description
    #[serde(rename = "descripcion")]
    pub description: String,
    /// Unit price in cents
    #[serde(rename = "precio")]
    pub price: u64,
    /// Initial stock
    pub stock: u32,
    /// Decant size
    #[serde(rename = "volumen")]
    pub volume: String,
    /// Seasonal category
    #[serde(rename = "categoria")]
    pub category: String,
    /// Target gender (defaults to unisex)
    #[serde(rename = "genero")]
    pub gender: Option<String>,
    /// Image URL paths (upload storage is a separate service)
    #[serde(rename = "imagenes")]
    pub images: Option<Vec<String>>,
}

/// Request to update a product; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductBody {
    /// New display name
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    /// New fragrance house
    #[serde(rename = "marca")]
    pub brand: Option<String>,
    /// New description
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    /// New unit price in cents
    #[serde(rename = "precio")]
    pub price: Option<u64>,
    /// New stock count
    pub stock: Option<u32>,
    /// New decant size
    #[serde(rename = "volumen")]
    pub volume: Option<String>,
    /// New seasonal category
    #[serde(rename = "categoria")]
    pub category: Option<String>,
    /// New target gender
    #[serde(rename = "genero")]
    pub gender: Option<String>,
    /// New active flag
    #[serde(rename = "activo")]
    pub active: Option<bool>,
    /// Images to append
    #[serde(rename = "imagenes")]
    pub images: Option<Vec<String>>,
}

/// Request for the stock adjustment endpoint.
#[derive(Debug, Deserialize)]
pub struct UpdateStockBody {
    /// Units to add or the new count
    #[serde(rename = "cantidad")]
    pub quantity: u32,
    /// `agregar` to add; anything else replaces the count
    #[serde(rename = "operacion")]
    pub operation: Option<String>,
}

/// Response for the stock adjustment endpoint.
#[derive(Debug, Serialize)]
pub struct UpdateStockResponse {
    /// Always true on success
    pub success: bool,
    /// Human-readable message
    pub message: String,
    /// Adjusted product summary
    pub data: StockData,
}

/// Stock summary inside [`UpdateStockResponse`].
#[derive(Debug, Serialize)]
pub struct StockData {
    /// Product id
    pub id: Uuid,
    /// Product name
    #[serde(rename = "nombre")]
    pub name: String,
    /// Stock after the adjustment
    pub stock: u32,
}

/// Response for deletions.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Always true on success
    pub success: bool,
    /// Human-readable message
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// List active products with filters, sorting, and pagination.
///
/// Public endpoint.
///
/// # Example
///
/// ```bash
/// curl 'http://localhost:5000/api/products?categoria=verano&ordenar=precio-asc&page=1'
/// ```
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ListProductsResponse>, AppError> {
    let filter = ProductFilter {
        category: parse_optional(query.category.as_deref(), Category::parse, "Categoría inválida")?,
        gender: parse_optional(query.gender.as_deref(), Gender::parse, "Género inválido")?,
        price_min: query.price_min.map(Money::from_cents),
        price_max: query.price_max.map(Money::from_cents),
        search: query.search,
        active_only: true,
    };

    let sort = match query.sort.as_deref() {
        Some("precio-asc") => ProductSort::PriceAsc,
        Some("precio-desc") => ProductSort::PriceDesc,
        Some("nombre") => ProductSort::Name,
        Some("mas-vendidos") => ProductSort::BestSelling,
        _ => ProductSort::Newest,
    };

    let page = page_from_query(query.page, query.limit, PRODUCTS_PAGE_LIMIT);
    let result = state.catalog.list(&filter, sort, page).await?;
    let pagination = PaginationDto::with_has_more(&result);

    Ok(Json(ListProductsResponse {
        success: true,
        data: result.items.into_iter().map(ProductDto::from).collect(),
        pagination,
    }))
}

/// Product detail.
///
/// Public endpoint; also returns inactive products (the admin panel links
/// here).
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = state
        .catalog
        .get(ProductId::from_uuid(id))
        .await?
        .ok_or_else(|| AppError::not_found("Producto", id))?;

    Ok(Json(ProductResponse {
        success: true,
        message: None,
        data: product.into(),
    }))
}

/// Create a product (admin).
pub async fn create_product(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateProductBody>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let new = NewProduct {
        name: body.name,
        brand: body.brand,
        description: body.description,
        volume: parse_required(&body.volume, Volume::parse, "Volumen inválido")?,
        price: Money::from_cents(body.price),
        stock: body.stock,
        images: body.images.unwrap_or_default(),
        category: parse_required(&body.category, Category::parse, "Categoría inválida")?,
        gender: parse_optional(body.gender.as_deref(), Gender::parse, "Género inválido")?
            .unwrap_or_default(),
    };

    let product = catalog::create_product(state.catalog.as_ref(), new).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            success: true,
            message: None,
            data: product.into(),
        }),
    ))
}

/// Update a product (admin).
pub async fn update_product(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProductBody>,
) -> Result<Json<ProductResponse>, AppError> {
    let patch = ProductPatch {
        name: body.name,
        brand: body.brand,
        description: body.description,
        volume: parse_optional(body.volume.as_deref(), Volume::parse, "Volumen inválido")?,
        price: body.price.map(Money::from_cents),
        stock: body.stock,
        category: parse_optional(body.category.as_deref(), Category::parse, "Categoría inválida")?,
        gender: parse_optional(body.gender.as_deref(), Gender::parse, "Género inválido")?,
        active: body.active,
        add_images: body.images.unwrap_or_default(),
    };

    let product =
        catalog::update_product(state.catalog.as_ref(), ProductId::from_uuid(id), patch).await?;
    Ok(Json(ProductResponse {
        success: true,
        message: Some("Producto actualizado exitosamente".to_string()),
        data: product.into(),
    }))
}

/// Delete a product (admin).
///
/// Orders keep their own snapshots, so history is unaffected.
pub async fn delete_product(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    catalog::remove_product(state.catalog.as_ref(), ProductId::from_uuid(id)).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Producto eliminado exitosamente".to_string(),
    }))
}

/// Remove one image from a product by index (admin).
pub async fn delete_product_image(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<ProductResponse>, AppError> {
    let product =
        catalog::remove_product_image(state.catalog.as_ref(), ProductId::from_uuid(id), index)
            .await?;
    Ok(Json(ProductResponse {
        success: true,
        message: Some("Imagen eliminada exitosamente".to_string()),
        data: product.into(),
    }))
}

/// Adjust stock (admin): `operacion: "agregar"` adds, anything else sets.
pub async fn update_stock(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStockBody>,
) -> Result<Json<UpdateStockResponse>, AppError> {
    if body.quantity == 0 {
        return Err(AppError::bad_request("Cantidad inválida"));
    }

    let op = if body.operation.as_deref() == Some("agregar") {
        StockOperation::Add(body.quantity)
    } else {
        StockOperation::Set(body.quantity)
    };

    let product =
        catalog::adjust_stock(state.catalog.as_ref(), ProductId::from_uuid(id), op).await?;
    Ok(Json(UpdateStockResponse {
        success: true,
        message: "Stock actualizado exitosamente".to_string(),
        data: StockData {
            id: *product.id.as_uuid(),
            name: product.name,
            stock: product.stock,
        },
    }))
}

fn parse_required<T>(
    value: &str,
    parse: impl Fn(&str) -> Option<T>,
    message: &str,
) -> Result<T, AppError> {
    parse(value).ok_or_else(|| AppError::bad_request(format!("{message}: {value}")))
}

fn parse_optional<T>(
    value: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
    message: &str,
) -> Result<Option<T>, AppError> {
    value
        .map(|v| parse_required(v, parse, message))
        .transpose()
}

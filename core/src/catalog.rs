//! Catalog administration.
//!
//! Create/update/delete for products, plus the admin stock adjustment. All
//! input validation lives here so the HTTP handlers stay thin adapters.

use crate::error::{CoreError, CoreResult};
use crate::store::{CatalogStore, StockOperation};
use crate::types::{Category, Gender, Money, Product, ProductId, Volume};
use chrono::Utc;
use tracing::info;

/// Maximum product name length
pub const MAX_NAME_LEN: usize = 100;
/// Maximum product description length
pub const MAX_DESCRIPTION_LEN: usize = 1000;

/// Fields for a new product.
#[derive(Clone, Debug)]
pub struct NewProduct {
    /// Display name
    pub name: String,
    /// Fragrance house
    pub brand: String,
    /// Marketing description
    pub description: String,
    /// Decant size
    pub volume: Volume,
    /// Unit price
    pub price: Money,
    /// Initial stock
    pub stock: u32,
    /// Image URL paths
    pub images: Vec<String>,
    /// Seasonal category
    pub category: Category,
    /// Target gender
    pub gender: Gender,
}

/// Partial update for a product; `None` fields are left unchanged. New
/// images are appended to the existing list.
#[derive(Clone, Debug, Default)]
pub struct ProductPatch {
    /// New display name
    pub name: Option<String>,
    /// New fragrance house
    pub brand: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New decant size
    pub volume: Option<Volume>,
    /// New unit price
    pub price: Option<Money>,
    /// New stock count
    pub stock: Option<u32>,
    /// New seasonal category
    pub category: Option<Category>,
    /// New target gender
    pub gender: Option<Gender>,
    /// New active flag
    pub active: Option<bool>,
    /// Images to append
    pub add_images: Vec<String>,
}

/// Creates a product.
///
/// # Errors
///
/// - [`CoreError::Validation`] for empty or over-long name/brand/description
/// - [`CoreError::Storage`] if the data store fails
pub async fn create_product(catalog: &dyn CatalogStore, new: NewProduct) -> CoreResult<Product> {
    validate_texts(&new.name, &new.brand, &new.description)?;

    let now = Utc::now();
    let product = Product {
        id: ProductId::new(),
        name: new.name.trim().to_string(),
        brand: new.brand.trim().to_string(),
        description: new.description,
        volume: new.volume,
        price: new.price,
        stock: new.stock,
        images: new.images,
        category: new.category,
        gender: new.gender,
        active: true,
        sales: 0,
        created_at: now,
        updated_at: now,
    };

    catalog.insert(product.clone()).await?;
    info!(product_id = %product.id, name = %product.name, "product created");
    Ok(product)
}

/// Applies a partial update to a product.
///
/// # Errors
///
/// - [`CoreError::ProductNotFound`] for an unknown id
/// - [`CoreError::Validation`] for empty or over-long name/brand/description
/// - [`CoreError::Storage`] if the data store fails
pub async fn update_product(
    catalog: &dyn CatalogStore,
    id: ProductId,
    patch: ProductPatch,
) -> CoreResult<Product> {
    let mut product = catalog
        .get(id)
        .await?
        .ok_or(CoreError::ProductNotFound(id))?;

    if let Some(name) = patch.name {
        product.name = name.trim().to_string();
    }
    if let Some(brand) = patch.brand {
        product.brand = brand.trim().to_string();
    }
    if let Some(description) = patch.description {
        product.description = description;
    }
    if let Some(volume) = patch.volume {
        product.volume = volume;
    }
    if let Some(price) = patch.price {
        product.price = price;
    }
    if let Some(stock) = patch.stock {
        product.stock = stock;
    }
    if let Some(category) = patch.category {
        product.category = category;
    }
    if let Some(gender) = patch.gender {
        product.gender = gender;
    }
    if let Some(active) = patch.active {
        product.active = active;
    }
    product.images.extend(patch.add_images);

    validate_texts(&product.name, &product.brand, &product.description)?;

    product.updated_at = Utc::now();
    catalog.update(product.clone()).await?;
    Ok(product)
}

/// Removes a product.
///
/// Order line items carry their own snapshots, so history survives; lines
/// referencing the removed product simply skip stock restoration on
/// cancellation.
///
/// # Errors
///
/// - [`CoreError::ProductNotFound`] for an unknown id
/// - [`CoreError::Storage`] if the data store fails
pub async fn remove_product(catalog: &dyn CatalogStore, id: ProductId) -> CoreResult<()> {
    if !catalog.delete(id).await? {
        return Err(CoreError::ProductNotFound(id));
    }
    info!(product_id = %id, "product deleted");
    Ok(())
}

/// Removes one image path from a product by index.
///
/// Only the catalog document is touched; the stored file belongs to the
/// upload service.
///
/// # Errors
///
/// - [`CoreError::ProductNotFound`] for an unknown id
/// - [`CoreError::Validation`] for an out-of-range index
/// - [`CoreError::Storage`] if the data store fails
pub async fn remove_product_image(
    catalog: &dyn CatalogStore,
    id: ProductId,
    index: usize,
) -> CoreResult<Product> {
    let mut product = catalog
        .get(id)
        .await?
        .ok_or(CoreError::ProductNotFound(id))?;

    if index >= product.images.len() {
        return Err(CoreError::validation("Índice de imagen inválido"));
    }
    product.images.remove(index);
    product.updated_at = Utc::now();
    catalog.update(product.clone()).await?;
    Ok(product)
}

/// Admin stock adjustment.
///
/// # Errors
///
/// - [`CoreError::ProductNotFound`] for an unknown id
/// - [`CoreError::Validation`] if the adjustment overflows
/// - [`CoreError::Storage`] if the data store fails
pub async fn adjust_stock(
    catalog: &dyn CatalogStore,
    id: ProductId,
    op: StockOperation,
) -> CoreResult<Product> {
    let product = catalog.adjust_stock(id, op).await?;
    info!(product_id = %id, stock = product.stock, "stock adjusted");
    Ok(product)
}

fn validate_texts(name: &str, brand: &str, description: &str) -> CoreResult<()> {
    if name.trim().is_empty() {
        return Err(CoreError::validation("El nombre del producto es obligatorio"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::validation(
            "El nombre no puede exceder 100 caracteres",
        ));
    }
    if brand.trim().is_empty() {
        return Err(CoreError::validation("La marca es obligatoria"));
    }
    if description.trim().is_empty() {
        return Err(CoreError::validation("La descripción es obligatoria"));
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(CoreError::validation(
            "La descripción no puede exceder 1000 caracteres",
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::stores::memory::InMemoryCatalogStore;

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            brand: "Casa".to_string(),
            description: "Una descripción".to_string(),
            volume: Volume::Ml5,
            price: Money::from_cents(8_000),
            stock: 10,
            images: vec!["/uploads/products/a.jpg".to_string()],
            category: Category::Verano,
            gender: Gender::Femenino,
        }
    }

    #[tokio::test]
    async fn create_then_patch() {
        let catalog = InMemoryCatalogStore::new();
        let product = create_product(&catalog, new_product("  Flor Blanca ")).await.unwrap();
        assert_eq!(product.name, "Flor Blanca");
        assert!(product.active);

        let patched = update_product(
            &catalog,
            product.id,
            ProductPatch {
                price: Some(Money::from_cents(9_500)),
                active: Some(false),
                add_images: vec!["/uploads/products/b.jpg".to_string()],
                ..ProductPatch::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(patched.price, Money::from_cents(9_500));
        assert!(!patched.active);
        assert_eq!(patched.images.len(), 2);
    }

    #[tokio::test]
    async fn rejects_blank_and_oversized_fields() {
        let catalog = InMemoryCatalogStore::new();
        let err = create_product(&catalog, new_product("   ")).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = create_product(&catalog, new_product(&"x".repeat(MAX_NAME_LEN + 1)))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn image_removal_by_index() {
        let catalog = InMemoryCatalogStore::new();
        let mut new = new_product("Fotos");
        new.images.push("/uploads/products/b.jpg".to_string());
        let product = create_product(&catalog, new).await.unwrap();

        let after = remove_product_image(&catalog, product.id, 0).await.unwrap();
        assert_eq!(after.images, vec!["/uploads/products/b.jpg".to_string()]);

        let err = remove_product_image(&catalog, product.id, 5).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn stock_adjustment_add_and_set() {
        let catalog = InMemoryCatalogStore::new();
        let product = create_product(&catalog, new_product("Ajuste")).await.unwrap();

        let after = adjust_stock(&catalog, product.id, StockOperation::Add(5))
            .await
            .unwrap();
        assert_eq!(after.stock, 15);

        let after = adjust_stock(&catalog, product.id, StockOperation::Set(3))
            .await
            .unwrap();
        assert_eq!(after.stock, 3);

        let err = adjust_stock(&catalog, ProductId::new(), StockOperation::Add(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(_)));
    }
}

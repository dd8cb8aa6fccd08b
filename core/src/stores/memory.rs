//! In-memory store implementations.
//!
//! Back the test suite and databaseless development. Both stores keep their
//! documents in a `tokio` `RwLock`'d map; `reserve` performs its
//! check-and-decrement under one write lock, which is what makes concurrent
//! checkouts of the last units serialize.

use crate::error::{CoreError, CoreResult};
use crate::store::{
    CatalogStore, OrderFilter, OrderStats, OrderStore, Page, Paginated, ProductFilter,
    ProductSort, StockOperation,
};
use crate::types::{Order, OrderId, Product, ProductId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory product collection.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryCatalogStore {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn insert(&self, product: Product) -> CoreResult<()> {
        self.products.write().await.insert(product.id, product);
        Ok(())
    }

    async fn get(&self, id: ProductId) -> CoreResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn update(&self, product: Product) -> CoreResult<()> {
        let mut products = self.products.write().await;
        if !products.contains_key(&product.id) {
            return Err(CoreError::ProductNotFound(product.id));
        }
        products.insert(product.id, product);
        Ok(())
    }

    async fn delete(&self, id: ProductId) -> CoreResult<bool> {
        Ok(self.products.write().await.remove(&id).is_some())
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: Page,
    ) -> CoreResult<Paginated<Product>> {
        let products = self.products.read().await;
        let mut matching: Vec<Product> = products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();

        match sort {
            ProductSort::Newest => matching.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ProductSort::PriceAsc => matching.sort_by(|a, b| a.price.cmp(&b.price)),
            ProductSort::PriceDesc => matching.sort_by(|a, b| b.price.cmp(&a.price)),
            ProductSort::Name => matching.sort_by(|a, b| a.name.cmp(&b.name)),
            ProductSort::BestSelling => matching.sort_by(|a, b| b.sales.cmp(&a.sales)),
        }

        let total = matching.len() as u64;
        let items = paginate(matching, page);
        Ok(Paginated::new(items, page, total))
    }

    async fn reserve(&self, id: ProductId, quantity: u32) -> CoreResult<Product> {
        // Check and decrement under one write lock: the availability test and
        // the mutation are indivisible.
        let mut products = self.products.write().await;
        let product = products.get_mut(&id).ok_or(CoreError::ProductNotFound(id))?;

        if !product.is_available(quantity) {
            return Err(CoreError::InsufficientStock {
                product_id: id,
                name: product.name.clone(),
                available: product.stock,
            });
        }

        product.stock -= quantity;
        product.sales = product.sales.saturating_add(quantity);
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn restock(&self, id: ProductId, quantity: u32) -> CoreResult<bool> {
        let mut products = self.products.write().await;
        let Some(product) = products.get_mut(&id) else {
            return Ok(false);
        };
        product.stock = product.stock.saturating_add(quantity);
        product.sales = product.sales.saturating_sub(quantity);
        product.updated_at = Utc::now();
        Ok(true)
    }

    async fn adjust_stock(&self, id: ProductId, op: StockOperation) -> CoreResult<Product> {
        let mut products = self.products.write().await;
        let product = products.get_mut(&id).ok_or(CoreError::ProductNotFound(id))?;

        match op {
            StockOperation::Add(quantity) => {
                product.stock = product
                    .stock
                    .checked_add(quantity)
                    .ok_or_else(|| CoreError::validation("Cantidad inválida"))?;
            }
            StockOperation::Set(quantity) => product.stock = quantity,
        }
        product.updated_at = Utc::now();
        Ok(product.clone())
    }
}

/// In-memory order collection.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    /// Creates an empty order collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> CoreResult<()> {
        self.orders.write().await.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, id: OrderId) -> CoreResult<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn update(&self, order: Order) -> CoreResult<()> {
        let mut orders = self.orders.write().await;
        if !orders.contains_key(&order.id) {
            return Err(CoreError::OrderNotFound(order.id));
        }
        orders.insert(order.id, order);
        Ok(())
    }

    async fn delete(&self, id: OrderId) -> CoreResult<bool> {
        Ok(self.orders.write().await.remove(&id).is_some())
    }

    async fn list_for_user(&self, user_id: UserId, page: Page) -> CoreResult<Paginated<Order>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        sort_newest_first(&mut matching);

        let total = matching.len() as u64;
        let items = paginate(matching, page);
        Ok(Paginated::new(items, page, total))
    }

    async fn list(
        &self,
        filter: &OrderFilter,
        page: Page,
    ) -> CoreResult<(Paginated<Order>, OrderStats)> {
        let orders = self.orders.read().await;
        let mut matching: Vec<Order> = orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        sort_newest_first(&mut matching);

        let mut stats = OrderStats::default();
        for order in &matching {
            stats.absorb(order);
        }

        let total = matching.len() as u64;
        let items = paginate(matching, page);
        Ok((Paginated::new(items, page, total), stats))
    }

    async fn created_since(&self, cutoff: DateTime<Utc>) -> CoreResult<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|o| o.created_at >= cutoff)
            .cloned()
            .collect())
    }
}

fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.as_uuid().cmp(a.id.as_uuid())));
}

fn paginate<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
        .take(page.limit as usize)
        .collect()
}

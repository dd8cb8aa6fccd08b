//! Store contracts for the catalog and order collections.
//!
//! The storefront is backed by two document collections. All access goes
//! through these traits so the web layer and the domain services stay
//! storage-agnostic; implementations live in [`crate::stores`].
//!
//! The one contract with real teeth is [`CatalogStore::reserve`]: it must
//! check availability and decrement stock as a single atomic step, so two
//! concurrent checkouts of the last units serialize and exactly one wins.

use crate::error::CoreResult;
use crate::types::{
    Category, Gender, Money, Order, OrderId, OrderStatus, Product, ProductId, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Pagination
// ============================================================================

/// A page request (1-based page number plus page size).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number
    pub number: u32,
    /// Items per page
    pub limit: u32,
}

impl Page {
    /// Largest accepted page size
    pub const MAX_LIMIT: u32 = 100;

    /// Creates a page request, clamping the number to at least 1 and the
    /// limit into `1..=MAX_LIMIT`.
    #[must_use]
    pub const fn new(number: u32, limit: u32) -> Self {
        let number = if number == 0 { 1 } else { number };
        let limit = if limit == 0 {
            1
        } else if limit > Self::MAX_LIMIT {
            Self::MAX_LIMIT
        } else {
            limit
        };
        Self { number, limit }
    }

    /// Number of items to skip
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.number as u64 - 1) * self.limit as u64
    }
}

/// A page of results plus the pagination envelope the API returns.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// 1-based page number
    pub page: u32,
    /// Page size requested
    pub limit: u32,
    /// Total matching items across all pages
    pub total: u64,
    /// Total number of pages
    pub pages: u64,
}

impl<T> Paginated<T> {
    /// Assembles a page, deriving the page count from the total.
    #[must_use]
    pub fn new(items: Vec<T>, page: Page, total: u64) -> Self {
        Self {
            items,
            page: page.number,
            limit: page.limit,
            total,
            pages: total.div_ceil(u64::from(page.limit)),
        }
    }

    /// Whether pages remain after this one
    #[must_use]
    pub const fn has_more(&self) -> bool {
        (self.page as u64) < self.pages
    }
}

// ============================================================================
// Catalog queries
// ============================================================================

/// Filters for the catalog browse surface.
#[derive(Clone, Debug, Default)]
pub struct ProductFilter {
    /// Restrict to a seasonal category
    pub category: Option<Category>,
    /// Restrict to a target gender
    pub gender: Option<Gender>,
    /// Minimum price, inclusive
    pub price_min: Option<Money>,
    /// Maximum price, inclusive
    pub price_max: Option<Money>,
    /// Case-insensitive text search over name, brand, and description
    pub search: Option<String>,
    /// Only active products (the public listing always sets this)
    pub active_only: bool,
}

impl ProductFilter {
    /// Whether a product passes this filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if self.active_only && !product.active {
            return false;
        }
        if self.category.is_some_and(|c| c != product.category) {
            return false;
        }
        if self.gender.is_some_and(|g| g != product.gender) {
            return false;
        }
        if self.price_min.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.price_max.is_some_and(|max| product.price > max) {
            return false;
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let haystack = format!(
                "{} {} {}",
                product.name.to_lowercase(),
                product.brand.to_lowercase(),
                product.description.to_lowercase()
            );
            if !haystack.contains(&term) {
                return false;
            }
        }
        true
    }
}

/// Sort orders for the catalog listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProductSort {
    /// Most recently created first
    #[default]
    Newest,
    /// Cheapest first
    PriceAsc,
    /// Most expensive first
    PriceDesc,
    /// Alphabetical by name
    Name,
    /// Highest sales counter first
    BestSelling,
}

/// Admin stock adjustment. Quantities are unsigned, so an adjustment can
/// never drive stock negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StockOperation {
    /// Add units to the current count
    Add(u32),
    /// Replace the current count
    Set(u32),
}

// ============================================================================
// Order queries
// ============================================================================

/// Filters for the admin order listing.
#[derive(Clone, Debug, Default)]
pub struct OrderFilter {
    /// Restrict to one status
    pub status: Option<OrderStatus>,
    /// Orders created at or after this instant
    pub date_from: Option<DateTime<Utc>>,
    /// Orders created at or before this instant
    pub date_to: Option<DateTime<Utc>>,
}

impl OrderFilter {
    /// Whether an order passes this filter.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        if self.status.is_some_and(|s| s != order.status) {
            return false;
        }
        if self.date_from.is_some_and(|from| order.created_at < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| order.created_at > to) {
            return false;
        }
        true
    }
}

/// Aggregate figures over a filtered order set, returned alongside the admin
/// listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStats {
    /// Sum of order totals across the filtered set
    #[serde(rename = "totalVentas")]
    pub total_revenue: Money,
    /// Orders currently `pendiente`
    #[serde(rename = "pedidosPendientes")]
    pub pending: u64,
    /// Orders currently `pagado`
    #[serde(rename = "pedidosPagados")]
    pub paid: u64,
    /// Orders currently `enviado`
    #[serde(rename = "pedidosEnviados")]
    pub shipped: u64,
}

impl OrderStats {
    /// Accumulates one order into the aggregate.
    pub fn absorb(&mut self, order: &Order) {
        self.total_revenue = self
            .total_revenue
            .checked_add(order.total)
            .unwrap_or(self.total_revenue);
        match order.status {
            OrderStatus::Pending => self.pending += 1,
            OrderStatus::Paid => self.paid += 1,
            OrderStatus::Shipped => self.shipped += 1,
            _ => {}
        }
    }
}

// ============================================================================
// Contracts
// ============================================================================

/// The product collection.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Inserts a new product.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Storage`] on data-store failure.
    async fn insert(&self, product: Product) -> CoreResult<()>;

    /// Fetches a product by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Storage`] on data-store failure.
    async fn get(&self, id: ProductId) -> CoreResult<Option<Product>>;

    /// Replaces a product document.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::ProductNotFound`] when the product does
    /// not exist, or [`crate::CoreError::Storage`] on data-store failure.
    async fn update(&self, product: Product) -> CoreResult<()>;

    /// Removes a product. Returns `false` when it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Storage`] on data-store failure.
    async fn delete(&self, id: ProductId) -> CoreResult<bool>;

    /// Lists products matching `filter`, sorted and paginated.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Storage`] on data-store failure.
    async fn list(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: Page,
    ) -> CoreResult<Paginated<Product>>;

    /// Atomically checks availability and reserves `quantity` units:
    /// `stock -= quantity; sales += quantity`. Returns the product as it was
    /// *after* the mutation.
    ///
    /// The availability check and the decrement are one indivisible step:
    /// concurrent reservations of the same units must serialize so that
    /// stock can never go negative.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::ProductNotFound`] for an unknown id,
    /// [`crate::CoreError::InsufficientStock`] when the product is inactive
    /// or short (without mutating anything), or
    /// [`crate::CoreError::Storage`] on data-store failure.
    async fn reserve(&self, id: ProductId, quantity: u32) -> CoreResult<Product>;

    /// Inverse of [`CatalogStore::reserve`]: `stock += quantity` and
    /// `sales -= quantity` (saturating at zero). Returns `false` when the
    /// product no longer exists; callers skip such lines rather than fail.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Storage`] on data-store failure.
    async fn restock(&self, id: ProductId, quantity: u32) -> CoreResult<bool>;

    /// Admin stock adjustment. Returns the product after the change.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::ProductNotFound`] for an unknown id or
    /// [`crate::CoreError::Storage`] on data-store failure.
    async fn adjust_stock(&self, id: ProductId, op: StockOperation) -> CoreResult<Product>;
}

/// The order collection.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Storage`] on data-store failure.
    async fn insert(&self, order: Order) -> CoreResult<()>;

    /// Fetches an order by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Storage`] on data-store failure.
    async fn get(&self, id: OrderId) -> CoreResult<Option<Order>>;

    /// Replaces an order document (status and payment-reference changes).
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::OrderNotFound`] when the order does not
    /// exist, or [`crate::CoreError::Storage`] on data-store failure.
    async fn update(&self, order: Order) -> CoreResult<()>;

    /// Removes an order. Returns `false` when it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Storage`] on data-store failure.
    async fn delete(&self, id: OrderId) -> CoreResult<bool>;

    /// One user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Storage`] on data-store failure.
    async fn list_for_user(&self, user_id: UserId, page: Page) -> CoreResult<Paginated<Order>>;

    /// Admin listing: filtered, newest first, with aggregate stats over the
    /// whole filtered set (not just the returned page).
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Storage`] on data-store failure.
    async fn list(
        &self,
        filter: &OrderFilter,
        page: Page,
    ) -> CoreResult<(Paginated<Order>, OrderStats)>;

    /// All orders created at or after `cutoff`, for the sales analytics
    /// window.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::Storage`] on data-store failure.
    async fn created_since(&self, cutoff: DateTime<Utc>) -> CoreResult<Vec<Order>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_clamps_degenerate_values() {
        let page = Page::new(0, 0);
        assert_eq!(page, Page::new(1, 1));
        assert_eq!(Page::new(2, 500).limit, Page::MAX_LIMIT);
        assert_eq!(Page::new(3, 10).offset(), 20);
    }

    #[test]
    fn paginated_page_count_rounds_up() {
        let paginated = Paginated::new(vec![1, 2, 3], Page::new(1, 3), 7);
        assert_eq!(paginated.pages, 3);
        assert!(paginated.has_more());

        let last = Paginated::<u32>::new(vec![], Page::new(3, 3), 7);
        assert!(!last.has_more());
    }
}

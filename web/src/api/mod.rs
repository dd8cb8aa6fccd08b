//! HTTP API endpoints.
//!
//! Request and response types keep the Spanish wire field names the
//! storefront frontend has always consumed; handlers are thin adapters over
//! the domain services in `decant-core`.

pub mod orders;
pub mod payments;
pub mod products;

use decant_core::{Page, Paginated};
use serde::Serialize;

/// Pagination envelope returned by the listing endpoints.
#[derive(Debug, Serialize)]
pub struct PaginationDto {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Total matching items
    pub total: u64,
    /// Total pages
    pub pages: u64,
    /// Whether pages remain (product listings only)
    #[serde(rename = "hasMore", skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

impl PaginationDto {
    /// Envelope without the `hasMore` flag (order listings).
    #[must_use]
    pub fn from_page<T>(page: &Paginated<T>) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total: page.total,
            pages: page.pages,
            has_more: None,
        }
    }

    /// Envelope with the `hasMore` flag (product listings).
    #[must_use]
    pub fn with_has_more<T>(page: &Paginated<T>) -> Self {
        Self {
            has_more: Some(page.has_more()),
            ..Self::from_page(page)
        }
    }
}

/// Default page for product listings
pub(crate) const PRODUCTS_PAGE_LIMIT: u32 = 12;
/// Default page for a customer's own orders
pub(crate) const MY_ORDERS_PAGE_LIMIT: u32 = 10;
/// Default page for the admin order listing
pub(crate) const ADMIN_ORDERS_PAGE_LIMIT: u32 = 20;

/// Builds a [`Page`] from optional query parameters.
pub(crate) const fn page_from_query(
    page: Option<u32>,
    limit: Option<u32>,
    default_limit: u32,
) -> Page {
    let number = match page {
        Some(n) => n,
        None => 1,
    };
    let limit = match limit {
        Some(l) => l,
        None => default_limit,
    };
    Page::new(number, limit)
}

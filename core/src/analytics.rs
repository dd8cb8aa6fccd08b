//! Sales analytics over the order collection.
//!
//! Aggregates revenue and best sellers over a sliding window, the numbers
//! behind the admin dashboard. Only orders that represent money actually in
//! flight count: `pagado`, `procesando`, `enviado`, `entregado`.

use crate::error::CoreResult;
use crate::store::OrderStore;
use crate::types::{Money, OrderStatus, ProductId};
use chrono::{DateTime, Datelike, Duration, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Statuses whose orders count toward revenue.
pub const REVENUE_STATUSES: [OrderStatus; 4] = [
    OrderStatus::Paid,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
];

/// How many products the report ranks.
const TOP_PRODUCT_COUNT: usize = 5;

/// Reporting window for the sales endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesPeriod {
    /// Since midnight today
    #[serde(rename = "dia")]
    Day,
    /// Last 7 days
    #[serde(rename = "semana")]
    Week,
    /// Last calendar month (the default)
    #[default]
    #[serde(rename = "mes")]
    Month,
    /// Last 12 months
    #[serde(rename = "año")]
    Year,
}

impl SalesPeriod {
    /// Maps a wire value; anything unrecognized falls back to the default
    /// window (last month), mirroring the original endpoint.
    #[must_use]
    pub fn from_wire(value: &str) -> Self {
        match value {
            "dia" => Self::Day,
            "semana" => Self::Week,
            "año" => Self::Year,
            _ => Self::Month,
        }
    }

    /// Wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "dia",
            Self::Week => "semana",
            Self::Month => "mes",
            Self::Year => "año",
        }
    }

    /// Start of the reporting window relative to `now`.
    #[must_use]
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Day => Utc
                .with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
                .single()
                .unwrap_or(now),
            Self::Week => now - Duration::days(7),
            Self::Month => now.checked_sub_months(Months::new(1)).unwrap_or(now),
            Self::Year => now.checked_sub_months(Months::new(12)).unwrap_or(now),
        }
    }
}

/// Revenue summary over the window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    /// Qualifying orders in the window
    #[serde(rename = "totalPedidos")]
    pub total_orders: u64,
    /// Sum of their totals
    #[serde(rename = "totalIngresos")]
    pub total_revenue: Money,
    /// Average order value (zero when there are no orders)
    #[serde(rename = "promedioTicket")]
    pub average_order: Money,
}

/// One ranked product in the report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopProduct {
    /// Product reference (snapshot; the product may no longer exist)
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    /// Product name as captured on the orders
    #[serde(rename = "nombre")]
    pub name: String,
    /// Units sold in the window
    #[serde(rename = "totalVendido")]
    pub units_sold: u64,
    /// Revenue attributed to the product
    #[serde(rename = "ingresos")]
    pub revenue: Money,
}

/// The sales report returned by the admin stats endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReport {
    /// Window that was reported on
    #[serde(rename = "periodo")]
    pub period: SalesPeriod,
    /// Start of the window
    #[serde(rename = "fechaInicio")]
    pub since: DateTime<Utc>,
    /// Revenue summary
    #[serde(rename = "resumen")]
    pub summary: SalesSummary,
    /// Best sellers, most units first
    #[serde(rename = "topProductos")]
    pub top_products: Vec<TopProduct>,
}

/// Builds the sales report for a window ending at `now`.
///
/// # Errors
///
/// Returns [`crate::CoreError::Storage`] if the data store fails.
pub async fn sales_report(
    orders: &dyn OrderStore,
    now: DateTime<Utc>,
    period: SalesPeriod,
) -> CoreResult<SalesReport> {
    let since = period.window_start(now);
    let window = orders.created_since(since).await?;

    let mut summary = SalesSummary::default();
    let mut by_product: HashMap<ProductId, TopProduct> = HashMap::new();

    for order in window
        .iter()
        .filter(|o| REVENUE_STATUSES.contains(&o.status))
    {
        summary.total_orders += 1;
        summary.total_revenue = summary
            .total_revenue
            .checked_add(order.total)
            .unwrap_or(summary.total_revenue);

        for item in &order.items {
            let entry = by_product
                .entry(item.product_id)
                .or_insert_with(|| TopProduct {
                    product_id: item.product_id,
                    name: item.name.clone(),
                    units_sold: 0,
                    revenue: Money::ZERO,
                });
            entry.units_sold += u64::from(item.quantity);
            entry.revenue = entry
                .revenue
                .checked_add(item.subtotal)
                .unwrap_or(entry.revenue);
        }
    }

    if summary.total_orders > 0 {
        summary.average_order =
            Money::from_cents(summary.total_revenue.cents() / summary.total_orders);
    }

    let mut top_products: Vec<TopProduct> = by_product.into_values().collect();
    top_products.sort_by(|a, b| {
        b.units_sold
            .cmp(&a.units_sold)
            .then_with(|| b.revenue.cmp(&a.revenue))
    });
    top_products.truncate(TOP_PRODUCT_COUNT);

    Ok(SalesReport {
        period,
        since,
        summary,
        top_products,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::OrderStore;
    use crate::stores::memory::InMemoryOrderStore;
    use crate::types::{
        LineItem, Order, OrderId, PaymentMethod, ShippingAddress, UserId, Volume,
    };

    fn order(status: OrderStatus, created_at: DateTime<Utc>, lines: &[(&str, u32, u64)]) -> Order {
        let items: Vec<LineItem> = lines
            .iter()
            .map(|(name, quantity, price_cents)| {
                let price = Money::from_cents(*price_cents);
                LineItem {
                    product_id: ProductId::new(),
                    name: (*name).to_string(),
                    price,
                    volume: Volume::Ml5,
                    quantity: *quantity,
                    subtotal: price.checked_multiply(*quantity).unwrap(),
                }
            })
            .collect();
        let total = items
            .iter()
            .fold(Money::ZERO, |acc, i| acc.checked_add(i.subtotal).unwrap());
        Order {
            id: OrderId::new(),
            user_id: UserId::new(),
            items,
            total,
            status,
            payment_method: PaymentMethod::Mercadopago,
            payment_ref: None,
            shipping_address: ShippingAddress {
                street: "x".to_string(),
                city: "x".to_string(),
                region: "x".to_string(),
                postal_code: "x".to_string(),
            },
            customer_notes: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn report_counts_only_revenue_statuses_inside_the_window() {
        let orders = InMemoryOrderStore::new();
        let now = Utc::now();

        orders
            .insert(order(OrderStatus::Paid, now - Duration::days(2), &[("A", 2, 1_000)]))
            .await
            .unwrap();
        orders
            .insert(order(OrderStatus::Pending, now - Duration::days(2), &[("B", 1, 9_000)]))
            .await
            .unwrap();
        orders
            .insert(order(OrderStatus::Cancelled, now - Duration::days(2), &[("C", 1, 9_000)]))
            .await
            .unwrap();
        orders
            .insert(order(OrderStatus::Shipped, now - Duration::days(60), &[("D", 1, 9_000)]))
            .await
            .unwrap();

        let report = sales_report(&orders, now, SalesPeriod::Month).await.unwrap();
        assert_eq!(report.summary.total_orders, 1);
        assert_eq!(report.summary.total_revenue, Money::from_cents(2_000));
        assert_eq!(report.summary.average_order, Money::from_cents(2_000));
        assert_eq!(report.top_products.len(), 1);
        assert_eq!(report.top_products[0].name, "A");
    }

    #[tokio::test]
    async fn top_products_rank_by_units_and_truncate_to_five() {
        let orders = InMemoryOrderStore::new();
        let now = Utc::now();

        let lines: Vec<(String, u32)> = (0..7).map(|i| (format!("P{i}"), i + 1)).collect();
        for (name, quantity) in &lines {
            orders
                .insert(order(
                    OrderStatus::Delivered,
                    now - Duration::days(1),
                    &[(name.as_str(), *quantity, 1_000)],
                ))
                .await
                .unwrap();
        }

        let report = sales_report(&orders, now, SalesPeriod::Week).await.unwrap();
        assert_eq!(report.top_products.len(), 5);
        assert_eq!(report.top_products[0].name, "P6");
        assert_eq!(report.top_products[0].units_sold, 7);
        assert_eq!(report.top_products[4].name, "P2");
    }

    #[test]
    fn period_windows() {
        let now = Utc.with_ymd_and_hms(2026, 3, 15, 13, 45, 0).single().unwrap();
        assert_eq!(
            SalesPeriod::Day.window_start(now),
            Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).single().unwrap()
        );
        assert_eq!(SalesPeriod::Week.window_start(now), now - Duration::days(7));
        assert_eq!(
            SalesPeriod::Month.window_start(now),
            Utc.with_ymd_and_hms(2026, 2, 15, 13, 45, 0).single().unwrap()
        );
        assert_eq!(SalesPeriod::from_wire("año"), SalesPeriod::Year);
        assert_eq!(SalesPeriod::from_wire("bogus"), SalesPeriod::Month);
    }
}

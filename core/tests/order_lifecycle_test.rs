//! Order lifecycle integration tests.
//!
//! Exercise complete flows across the placement service, the status machine,
//! and the payment boundary against the in-memory stores: place, pay, ship,
//! cancel, and the concurrency behavior of the last units.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use chrono::Utc;
use decant_core::store::{OrderFilter, Page};
use decant_core::stores::{InMemoryCatalogStore, InMemoryOrderStore};
use decant_core::{
    apply_mock_outcome, cancel_order, place_order, sales_report, set_status, Actor, CatalogStore,
    Category, CoreError, Gender, LineRequest, MockOutcome, Money, OrderStatus, OrderStore,
    PaymentMethod, PlaceOrderRequest, Product, ProductId, SalesPeriod, ShippingAddress, UserId,
    Volume,
};
use std::sync::Arc;

fn product(name: &str, stock: u32, price_cents: u64) -> Product {
    let now = Utc::now();
    Product {
        id: ProductId::new(),
        name: name.to_string(),
        brand: "Casa Integración".to_string(),
        description: "decant".to_string(),
        volume: Volume::Ml10,
        price: Money::from_cents(price_cents),
        stock,
        images: vec![],
        category: Category::Invierno,
        gender: Gender::Unisex,
        active: true,
        sales: 0,
        created_at: now,
        updated_at: now,
    }
}

fn request(lines: Vec<LineRequest>) -> PlaceOrderRequest {
    PlaceOrderRequest {
        items: lines,
        shipping_address: ShippingAddress {
            street: "Av. Apoquindo 4501".to_string(),
            city: "Santiago".to_string(),
            region: "RM".to_string(),
            postal_code: "7550000".to_string(),
        },
        payment_method: PaymentMethod::Mercadopago,
        customer_notes: None,
    }
}

/// The full §happy-path: place, pay, progress to delivered, and watch the
/// sales report pick it up.
#[tokio::test]
async fn place_pay_ship_deliver() {
    let catalog = InMemoryCatalogStore::new();
    let orders = InMemoryOrderStore::new();
    let p = product("Tabaco y Vainilla", 10, 15_000);
    catalog.insert(p.clone()).await.unwrap();

    let user = UserId::new();
    let admin = Actor::admin(UserId::new());

    let order = place_order(
        &catalog,
        &orders,
        user,
        request(vec![LineRequest { product_id: p.id, quantity: 2 }]),
    )
    .await
    .unwrap();
    assert_eq!(order.total, Money::from_cents(30_000));

    let order = apply_mock_outcome(&catalog, &orders, order.id, MockOutcome::Approved)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Paid);

    for status in [OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered] {
        let order = set_status(&catalog, &orders, order.id, status, admin).await.unwrap();
        assert_eq!(order.status, status);
    }

    // Sold units stay sold through the whole progression.
    let stocked = catalog.get(p.id).await.unwrap().unwrap();
    assert_eq!(stocked.stock, 8);
    assert_eq!(stocked.sales, 2);

    let report = sales_report(&orders, Utc::now(), SalesPeriod::Day).await.unwrap();
    assert_eq!(report.summary.total_orders, 1);
    assert_eq!(report.summary.total_revenue, Money::from_cents(30_000));

    // The admin listing aggregates over the filtered set.
    let (page, stats) = orders
        .list(&OrderFilter::default(), Page::new(1, 10))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(stats.total_revenue, Money::from_cents(30_000));
}

/// Spec scenario: stock 5, place 3, place 3 again (fails), cancel the first
/// (stock returns to 5).
#[tokio::test]
async fn place_fail_cancel_scenario() {
    let catalog = InMemoryCatalogStore::new();
    let orders = InMemoryOrderStore::new();
    let p = product("Agotable", 5, 1_000);
    catalog.insert(p.clone()).await.unwrap();
    let user = UserId::new();

    let first = place_order(
        &catalog,
        &orders,
        user,
        request(vec![LineRequest { product_id: p.id, quantity: 3 }]),
    )
    .await
    .unwrap();
    assert_eq!(first.total, Money::from_cents(3_000));
    assert_eq!(catalog.get(p.id).await.unwrap().unwrap().stock, 2);

    let err = place_order(
        &catalog,
        &orders,
        user,
        request(vec![LineRequest { product_id: p.id, quantity: 3 }]),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::InsufficientStock { available: 2, .. }));
    assert_eq!(catalog.get(p.id).await.unwrap().unwrap().stock, 2);

    cancel_order(&catalog, &orders, first.id, Actor::customer(user))
        .await
        .unwrap();
    let restored = catalog.get(p.id).await.unwrap().unwrap();
    assert_eq!(restored.stock, 5);
    assert_eq!(restored.sales, 0);
}

/// Ten concurrent single-unit checkouts against five units: exactly five
/// succeed, stock ends at zero, and never dips below it.
#[tokio::test]
async fn concurrent_checkouts_never_oversell() {
    let catalog = Arc::new(InMemoryCatalogStore::new());
    let orders = Arc::new(InMemoryOrderStore::new());
    let p = product("Última Gota", 5, 2_000);
    catalog.insert(p.clone()).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let catalog = catalog.clone();
        let orders = orders.clone();
        let product_id = p.id;
        handles.push(tokio::spawn(async move {
            place_order(
                catalog.as_ref(),
                orders.as_ref(),
                UserId::new(),
                request(vec![LineRequest { product_id, quantity: 1 }]),
            )
            .await
        }));
    }

    let mut successes = 0;
    let mut stock_failures = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(CoreError::InsufficientStock { .. }) => stock_failures += 1,
            Err(other) => unreachable!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 5);
    assert_eq!(stock_failures, 5);
    let drained = catalog.get(p.id).await.unwrap().unwrap();
    assert_eq!(drained.stock, 0);
    assert_eq!(drained.sales, 5);

    let (page, _) = orders
        .list(&OrderFilter::default(), Page::new(1, 20))
        .await
        .unwrap();
    assert_eq!(page.total, 5);
}

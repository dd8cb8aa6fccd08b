//! HTTP API integration tests.
//!
//! Spin up the full router on an ephemeral port with in-memory stores and
//! drive it over real HTTP: checkout, cancellation, payment simulation,
//! authorization, and the admin surface.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use decant_core::stores::{InMemoryCatalogStore, InMemoryOrderStore};
use decant_core::MockPaymentGateway;
use decant_web::auth::{AuthUser, StaticTokenAuthenticator};
use decant_web::config::PaymentConfig;
use decant_web::{build_router, AppState};
use decant_core::{Role, UserId};
use serde_json::{json, Value};
use std::sync::Arc;

const ADMIN_TOKEN: &str = "test-admin-token";
const CUSTOMER_TOKEN: &str = "test-customer-token";
const OTHER_TOKEN: &str = "test-other-token";

struct TestApp {
    base: String,
    client: reqwest::Client,
}

impl TestApp {
    async fn spawn() -> Self {
        let mut authenticator = StaticTokenAuthenticator::new();
        authenticator.insert(
            ADMIN_TOKEN,
            AuthUser { user_id: UserId::new(), role: Role::Admin },
        );
        authenticator.insert(
            CUSTOMER_TOKEN,
            AuthUser { user_id: UserId::new(), role: Role::Customer },
        );
        authenticator.insert(
            OTHER_TOKEN,
            AuthUser { user_id: UserId::new(), role: Role::Customer },
        );

        let state = AppState::new(
            Arc::new(InMemoryCatalogStore::new()),
            Arc::new(InMemoryOrderStore::new()),
            MockPaymentGateway::shared("http://localhost:5173".to_string()),
            Arc::new(authenticator),
            PaymentConfig {
                mock_mode: true,
                frontend_url: "http://localhost:5173".to_string(),
            },
        );

        let app = build_router(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server runs");
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
        }
    }

    async fn create_product(&self, name: &str, price_cents: u64, stock: u32) -> String {
        let response = self
            .client
            .post(format!("{}/api/products", self.base))
            .bearer_auth(ADMIN_TOKEN)
            .json(&json!({
                "nombre": name,
                "marca": "Casa Test",
                "descripcion": "Decant de prueba",
                "precio": price_cents,
                "stock": stock,
                "volumen": "5ml",
                "categoria": "verano",
                "genero": "unisex"
            }))
            .send()
            .await
            .expect("create product");
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.expect("json");
        body["data"]["id"].as_str().expect("product id").to_string()
    }

    async fn place_order(&self, token: &str, product_id: &str, quantity: u32) -> reqwest::Response {
        self.client
            .post(format!("{}/api/orders", self.base))
            .bearer_auth(token)
            .json(&json!({
                "items": [{"productId": product_id, "cantidad": quantity}],
                "direccionEnvio": {
                    "calle": "Av. Providencia 1234",
                    "ciudad": "Santiago",
                    "region": "RM",
                    "codigoPostal": "7500000"
                },
                "metodoPago": "mercadopago"
            }))
            .send()
            .await
            .expect("place order")
    }

    async fn product_stock(&self, product_id: &str) -> u64 {
        let body: Value = self
            .client
            .get(format!("{}/api/products/{product_id}", self.base))
            .send()
            .await
            .expect("get product")
            .json()
            .await
            .expect("json");
        body["data"]["stock"].as_u64().expect("stock")
    }
}

#[tokio::test]
async fn checkout_flow_places_pays_and_reports() {
    let app = TestApp::spawn().await;
    let product_id = app.create_product("Oud Real", 10_000, 5).await;

    // Public listing sees the product.
    let listing: Value = app
        .client
        .get(format!("{}/api/products", app.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing["pagination"]["total"], 1);

    // Place an order for 3 units.
    let response = app.place_order(CUSTOMER_TOKEN, &product_id, 3).await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["total"], 30_000);
    assert_eq!(body["data"]["estado"], "pendiente");
    assert_eq!(body["data"]["items"][0]["subtotal"], 30_000);
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    assert_eq!(app.product_stock(&product_id).await, 2);

    // Create a payment preference.
    let preference: Value = app
        .client
        .post(format!("{}/api/payments/create-preference", app.base))
        .bearer_auth(CUSTOMER_TOKEN)
        .json(&json!({"orderId": order_id}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(preference["mock"], true);
    assert!(preference["data"]["id"].as_str().unwrap().starts_with("mock-"));

    // Approve the mock payment.
    let paid: Value = app
        .client
        .post(format!("{}/api/payments/mock-payment", app.base))
        .bearer_auth(CUSTOMER_TOKEN)
        .json(&json!({"orderId": order_id, "estado": "approved"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(paid["data"]["estado"], "pagado");
    assert!(paid["data"]["pagoId"].as_str().unwrap().starts_with("mock-payment-"));

    // The paid order shows up in the sales report.
    let stats: Value = app
        .client
        .get(format!("{}/api/orders/stats/ventas?periodo=dia", app.base))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["data"]["resumen"]["totalPedidos"], 1);
    assert_eq!(stats["data"]["resumen"]["totalIngresos"], 30_000);
    assert_eq!(stats["data"]["topProductos"][0]["totalVendido"], 3);
}

#[tokio::test]
async fn insufficient_stock_is_rejected_without_mutation() {
    let app = TestApp::spawn().await;
    let product_id = app.create_product("Escaso", 1_000, 2).await;

    let response = app.place_order(CUSTOMER_TOKEN, &product_id, 3).await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("Stock insuficiente"));
    assert!(message.contains("Disponible: 2"));

    assert_eq!(app.product_stock(&product_id).await, 2);
}

#[tokio::test]
async fn cancellation_restores_stock_and_is_single_shot() {
    let app = TestApp::spawn().await;
    let product_id = app.create_product("Reversible", 1_000, 5).await;

    let body: Value = app
        .place_order(CUSTOMER_TOKEN, &product_id, 3)
        .await
        .json()
        .await
        .unwrap();
    let order_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(app.product_stock(&product_id).await, 2);

    let response = app
        .client
        .delete(format!("{}/api/orders/{order_id}", app.base))
        .bearer_auth(CUSTOMER_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(app.product_stock(&product_id).await, 5);

    // A cancelled order cannot be cancelled again.
    let response = app
        .client
        .delete(format!("{}/api/orders/{order_id}", app.base))
        .bearer_auth(CUSTOMER_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(app.product_stock(&product_id).await, 5);
}

#[tokio::test]
async fn rejected_mock_payment_cancels_and_restores_stock() {
    let app = TestApp::spawn().await;
    let product_id = app.create_product("Rechazado", 1_000, 4).await;

    let body: Value = app
        .place_order(CUSTOMER_TOKEN, &product_id, 2)
        .await
        .json()
        .await
        .unwrap();
    let order_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(app.product_stock(&product_id).await, 2);

    let rejected: Value = app
        .client
        .post(format!("{}/api/payments/mock-payment", app.base))
        .bearer_auth(CUSTOMER_TOKEN)
        .json(&json!({"orderId": order_id, "estado": "rejected"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rejected["data"]["estado"], "cancelado");
    assert_eq!(app.product_stock(&product_id).await, 4);
}

#[tokio::test]
async fn authorization_matrix() {
    let app = TestApp::spawn().await;
    let product_id = app.create_product("Privado", 1_000, 5).await;

    // No token: 401.
    let response = app
        .client
        .get(format!("{}/api/orders/mis-pedidos", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    // Customer token on an admin route: 403.
    let response = app
        .client
        .get(format!("{}/api/orders", app.base))
        .bearer_auth(CUSTOMER_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // A stranger cannot read another customer's order; an admin can.
    let body: Value = app
        .place_order(CUSTOMER_TOKEN, &product_id, 1)
        .await
        .json()
        .await
        .unwrap();
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .client
        .get(format!("{}/api/orders/{order_id}", app.base))
        .bearer_auth(OTHER_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = app
        .client
        .get(format!("{}/api/orders/{order_id}", app.base))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn unknown_status_values_are_rejected_with_the_valid_list() {
    let app = TestApp::spawn().await;
    let product_id = app.create_product("Estado", 1_000, 5).await;

    let body: Value = app
        .place_order(CUSTOMER_TOKEN, &product_id, 1)
        .await
        .json()
        .await
        .unwrap();
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .client
        .patch(format!("{}/api/orders/{order_id}/estado", app.base))
        .bearer_auth(ADMIN_TOKEN)
        .json(&json!({"estado": "shipped"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("pendiente"));
    assert!(message.contains("cancelado"));

    // The order is untouched.
    let order: Value = app
        .client
        .get(format!("{}/api/orders/{order_id}", app.base))
        .bearer_auth(CUSTOMER_TOKEN)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(order["data"]["estado"], "pendiente");

    // A valid transition works.
    let response = app
        .client
        .patch(format!("{}/api/orders/{order_id}/estado", app.base))
        .bearer_auth(ADMIN_TOKEN)
        .json(&json!({"estado": "enviado"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["estado"], "enviado");
}

#[tokio::test]
async fn admin_hard_delete_requires_terminal_status() {
    let app = TestApp::spawn().await;
    let product_id = app.create_product("Borrable", 1_000, 5).await;

    let body: Value = app
        .place_order(CUSTOMER_TOKEN, &product_id, 1)
        .await
        .json()
        .await
        .unwrap();
    let order_id = body["data"]["id"].as_str().unwrap().to_string();

    // Pending orders cannot be hard-deleted.
    let response = app
        .client
        .delete(format!("{}/api/orders/{order_id}/admin", app.base))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // Cancel, then delete.
    app.client
        .delete(format!("{}/api/orders/{order_id}", app.base))
        .bearer_auth(CUSTOMER_TOKEN)
        .send()
        .await
        .unwrap();
    let response = app
        .client
        .delete(format!("{}/api/orders/{order_id}/admin", app.base))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = app
        .client
        .get(format!("{}/api/orders/{order_id}", app.base))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

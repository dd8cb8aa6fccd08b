//! Payment boundary endpoints.
//!
//! Pass-throughs to the injected payment gateway plus the mock payment
//! simulator used during development:
//! - POST /api/payments/create-preference - checkout preference (owner only)
//! - POST /api/payments/mock-payment - simulate an outcome (mock mode only)
//! - POST /api/payments/webhook - gateway notifications (public)
//! - GET /api/payments/verificar/:id - payment status stub

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::server::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use decant_core::{apply_mock_outcome, create_payment_preference, MockOutcome, OrderId, OrderStatus};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body for preference creation and the mock payment simulator.
#[derive(Debug, Deserialize)]
pub struct PaymentOrderBody {
    /// The order to pay
    #[serde(rename = "orderId")]
    pub order_id: Uuid,
    /// Simulated gateway outcome (mock payment only): `approved`,
    /// `rejected`, or anything else for `pending`
    #[serde(rename = "estado")]
    pub outcome: Option<String>,
}

/// Response for preference creation.
#[derive(Debug, Serialize)]
pub struct PreferenceResponse {
    /// Always true on success
    pub success: bool,
    /// Whether this preference came from the mock gateway
    pub mock: bool,
    /// The preference
    pub data: PreferenceData,
}

/// Preference payload inside [`PreferenceResponse`].
#[derive(Debug, Serialize)]
pub struct PreferenceData {
    /// Gateway preference id
    pub id: String,
    /// Redirect URL for the live checkout
    pub init_point: String,
    /// Redirect URL for the sandbox checkout
    pub sandbox_init_point: String,
}

/// Response for the mock payment simulator.
#[derive(Debug, Serialize)]
pub struct MockPaymentResponse {
    /// Always true on success
    pub success: bool,
    /// Human-readable message
    pub message: String,
    /// Updated order summary
    pub data: MockPaymentData,
}

/// Order summary inside [`MockPaymentResponse`].
#[derive(Debug, Serialize)]
pub struct MockPaymentData {
    /// The order that was updated
    #[serde(rename = "orderId")]
    pub order_id: Uuid,
    /// Status after the simulated payment
    #[serde(rename = "estado")]
    pub status: OrderStatus,
    /// Synthetic payment reference
    #[serde(rename = "pagoId")]
    pub payment_ref: Option<String>,
}

/// Response for the verification stub.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// Always true
    pub success: bool,
    /// Human-readable message
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a checkout preference for a pending order the caller owns.
pub async fn create_preference(
    user: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<PaymentOrderBody>,
) -> Result<Json<PreferenceResponse>, AppError> {
    let preference = create_payment_preference(
        state.orders.as_ref(),
        state.gateway.as_ref(),
        OrderId::from_uuid(body.order_id),
        user.actor(),
    )
    .await?;

    Ok(Json(PreferenceResponse {
        success: true,
        mock: state.payment.mock_mode,
        data: PreferenceData {
            id: preference.id,
            init_point: preference.init_point,
            sandbox_init_point: preference.sandbox_init_point,
        },
    }))
}

/// Simulate a gateway outcome for an order (mock mode only).
///
/// `approved` marks the order `pagado`, `rejected` cancels it and restores
/// stock, anything else leaves it `pendiente`. A synthetic payment reference
/// is recorded in every case.
pub async fn mock_payment(
    _user: CurrentUser,
    State(state): State<AppState>,
    Json(body): Json<PaymentOrderBody>,
) -> Result<Json<MockPaymentResponse>, AppError> {
    if !state.payment.mock_mode {
        return Err(AppError::forbidden("Modo mock no está activado"));
    }

    let outcome = MockOutcome::from_wire(body.outcome.as_deref().unwrap_or(""));
    let order = apply_mock_outcome(
        state.catalog.as_ref(),
        state.orders.as_ref(),
        OrderId::from_uuid(body.order_id),
        outcome,
    )
    .await?;

    Ok(Json(MockPaymentResponse {
        success: true,
        message: format!("Pago simulado: {}", order.status),
        data: MockPaymentData {
            order_id: *order.id.as_uuid(),
            status: order.status,
            payment_ref: order.payment_ref,
        },
    }))
}

/// Gateway notification webhook. Notifications are acknowledged and logged;
/// order state changes arrive through the payment verification flow.
pub async fn webhook(Json(payload): Json<serde_json::Value>) -> StatusCode {
    let kind = payload
        .get("type")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    info!(kind, payload = %payload, "payment webhook received");
    StatusCode::OK
}

/// Payment verification stub: the gateway integration is an external
/// collaborator.
pub async fn verify(
    _user: CurrentUser,
    Path(payment_id): Path<String>,
) -> Json<VerifyResponse> {
    info!(payment_id = %payment_id, "payment verification requested");
    Json(VerifyResponse {
        success: true,
        message: "Función de verificación de pago".to_string(),
    })
}

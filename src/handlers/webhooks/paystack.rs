use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::db::AppState;
use crate::payments::{PaystackWebhookEvent, SIGNATURE_HEADER};
use crate::reconcile::{self, ClaimedCharge, ReconcileOutcome};

use super::WebhookResult;

/// Upper bound on a webhook body. Charge events are a few KB.
const MAX_WEBHOOK_BODY: usize = 256 * 1024;

/// Receive a processor notification.
///
/// Steps short-circuit in this order:
/// 1. no webhook secret configured: 500, body untouched
/// 2. signature missing or wrong: 401, payload never parsed
/// 3. unparseable JSON: 400
/// 4. any event other than `charge.success`: 200, ignored, whatever its data
/// 5. charge data missing or unreadable, or a reference that does not decode: 400
/// 6. reconcile; applied, already applied and unknown order all answer 200
pub async fn handle_paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> impl IntoResponse {
    process_webhook(&state, &headers, body)
        .await
        .unwrap_or_else(|e| e)
}

async fn process_webhook(
    state: &AppState,
    headers: &HeaderMap,
    body: Body,
) -> Result<WebhookResult, WebhookResult> {
    let Some(verifier) = state.webhook_verifier.as_ref() else {
        tracing::error!("Webhook rejected: PAYSTACK_WEBHOOK_SECRET is not configured");
        return Err((StatusCode::INTERNAL_SERVER_ERROR, "Webhook not configured"));
    };

    let body: Bytes = axum::body::to_bytes(body, MAX_WEBHOOK_BODY)
        .await
        .map_err(|e| {
            tracing::debug!("Failed to read webhook body: {}", e);
            (StatusCode::BAD_REQUEST, "Unreadable body")
        })?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    if !verifier.verify(&body, signature) {
        tracing::warn!(
            signature_present = signature.is_some(),
            "Webhook signature verification failed"
        );
        return Err((StatusCode::UNAUTHORIZED, "Invalid signature"));
    }

    let event: PaystackWebhookEvent = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("Failed to parse signed webhook payload: {}", e);
        (StatusCode::BAD_REQUEST, "Invalid JSON")
    })?;

    if !event.is_charge_success() {
        tracing::debug!(event = %event.event, "Ignoring webhook event");
        return Ok((StatusCode::OK, "Event ignored"));
    }

    let data = event
        .charge_data()
        .map_err(|e| {
            tracing::warn!("charge.success webhook with unreadable data: {}", e);
            (StatusCode::BAD_REQUEST, "Invalid payment data")
        })?
        .ok_or_else(|| {
            tracing::warn!("charge.success webhook without data");
            (StatusCode::BAD_REQUEST, "Missing payment data")
        })?;

    let order_id = state.references.decode(&data.reference).map_err(|e| {
        // Signed by the processor but not one of ours: worth a look.
        tracing::warn!(
            reference = %data.reference,
            "Authenticated webhook with unrecognized reference: {}",
            e
        );
        (StatusCode::BAD_REQUEST, "Invalid reference")
    })?;

    let conn = state.db.get().map_err(|e| {
        tracing::error!("DB connection error: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
    })?;

    let claim = ClaimedCharge {
        amount_minor: data.amount,
        currency: data.currency,
    };
    let outcome = reconcile::reconcile_payment(&conn, order_id, &claim).map_err(|e| {
        tracing::error!(order_id = %order_id, "Reconciliation failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Database error")
    })?;

    tracing::debug!(order_id = %order_id, outcome = outcome.as_str(), "Webhook reconciled");

    Ok(match outcome {
        ReconcileOutcome::Applied(_) => (StatusCode::OK, "Payment applied"),
        ReconcileOutcome::AlreadyApplied(_) => (StatusCode::OK, "Already processed"),
        // Acknowledge so the processor stops retrying; logged by the reconciler.
        ReconcileOutcome::OrderNotFound => (StatusCode::OK, "Order not found"),
    })
}

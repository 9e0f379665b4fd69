//! Customer-facing order endpoints used by the checkout flow.
//!
//! None of these write `payment_status`. Creating an order puts it in
//! (awaiting_payment, new); everything else is a read or an unpaid delete.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path, Query};
use crate::id::OrderId;
use crate::models::{CheckoutIntent, CreateOrder, Order, OrderStatus, PaymentStatus};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/orders", post(create_order))
        .route("/orders/{id}", get(get_order).delete(delete_order))
        .route("/orders/{id}/checkout", get(resume_checkout))
        .route("/customers/{customer_id}/orders", get(list_customer_orders))
        .route("/payment/return", get(payment_return))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn checkout_intent(state: &AppState, order: Order) -> CheckoutIntent {
    CheckoutIntent {
        reference: state.references.encode(order.id),
        amount_minor: order.total_minor,
        currency: order.currency.clone(),
        callback_url: format!("{}/payment/return", state.base_url.trim_end_matches('/')),
        order,
    }
}

fn validate_create(input: &CreateOrder) -> Result<()> {
    if input.customer_id.trim().is_empty() {
        return Err(AppError::BadRequest(msg::EMPTY_CUSTOMER.into()));
    }
    if input.total_minor < 0 {
        return Err(AppError::BadRequest(msg::NEGATIVE_TOTAL.into()));
    }
    if matches!(input.quantity, Some(q) if q <= 0) {
        return Err(AppError::BadRequest("quantity must be positive".into()));
    }
    Ok(())
}

/// Create a provisional order and return what hosted checkout needs.
///
/// The order exists before the customer pays, so the webhook always has a
/// row to reconcile against.
pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<CreateOrder>,
) -> Result<(StatusCode, Json<CheckoutIntent>)> {
    validate_create(&input)?;

    let conn = state.db.get()?;
    let order = queries::create_order(&conn, &input, &state.currency)?;

    tracing::info!(
        order_id = %order.id,
        total_minor = order.total_minor,
        currency = %order.currency,
        "Order created"
    );

    Ok((StatusCode::CREATED, Json(checkout_intent(&state, order))))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let conn = state.db.get()?;
    let order = queries::get_order(&conn, id)?.or_not_found(msg::ORDER_NOT_FOUND)?;
    Ok(Json(order))
}

/// Checkout details for an existing unpaid order ("Pay Now").
///
/// Reuses the order's reference, so a late webhook for an earlier attempt
/// and one for this attempt reconcile to the same row.
pub async fn resume_checkout(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<CheckoutIntent>> {
    let conn = state.db.get()?;
    let order = queries::get_order(&conn, id)?.or_not_found(msg::ORDER_NOT_FOUND)?;

    if !order.is_awaiting_payment() {
        return Err(AppError::Conflict(msg::ORDER_NOT_AWAITING_PAYMENT.into()));
    }
    if order.order_status == OrderStatus::Cancelled {
        return Err(AppError::Conflict("Order has been cancelled".into()));
    }

    Ok(Json(checkout_intent(&state, order)))
}

pub async fn list_customer_orders(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> Result<Json<Vec<Order>>> {
    let conn = state.db.get()?;
    Ok(Json(queries::list_orders_for_customer(&conn, &customer_id)?))
}

/// Delete an order the customer never paid for.
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<StatusCode> {
    let conn = state.db.get()?;

    if queries::delete_unpaid_order(&conn, id)? {
        tracing::info!(order_id = %id, "Unpaid order deleted");
        return Ok(StatusCode::NO_CONTENT);
    }

    // Nothing deleted: tell a missing order apart from a paid one.
    queries::get_order(&conn, id)?.or_not_found(msg::ORDER_NOT_FOUND)?;
    Err(AppError::Conflict(msg::ORDER_ALREADY_PAID.into()))
}

/// Query string the processor appends when redirecting back after checkout.
#[derive(Debug, Deserialize)]
pub struct PaymentReturnQuery {
    #[serde(default)]
    pub trxref: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentReturnResponse {
    pub order_id: OrderId,
    pub reference: String,
    /// `paid`, `pending` or `refunded`, from stored state only.
    pub status: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
}

/// Landing endpoint after hosted checkout.
///
/// Reports what the database says. The presence of a reference in the URL is
/// not evidence of payment, so an order the webhook has not reached yet is
/// reported as `pending`.
pub async fn payment_return(
    State(state): State<AppState>,
    Query(query): Query<PaymentReturnQuery>,
) -> Result<Json<PaymentReturnResponse>> {
    let reference = query
        .trxref
        .or(query.reference)
        .ok_or_else(|| AppError::BadRequest("trxref is required".into()))?;

    let order_id = state
        .references
        .decode(&reference)
        .map_err(|_| AppError::BadRequest(msg::INVALID_REFERENCE.into()))?;

    let conn = state.db.get()?;
    let order = queries::get_order(&conn, order_id)?.or_not_found(msg::ORDER_NOT_FOUND)?;

    let status = match order.payment_status {
        PaymentStatus::AwaitingPayment => "pending",
        PaymentStatus::Paid => "paid",
        PaymentStatus::Refunded => "refunded",
    };

    Ok(Json(PaymentReturnResponse {
        order_id: order.id,
        reference,
        status: status.to_string(),
        payment_status: order.payment_status,
        order_status: order.order_status,
    }))
}

//! Staff endpoints: fulfillment progression, order notes, refunds.

use axum::{
    Router,
    extract::State,
    middleware,
    routing::{patch, post},
};
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::{Json, Path};
use crate::fulfillment;
use crate::id::OrderId;
use crate::middleware::staff_auth;
use crate::models::{Order, OrderStatus, UpdateOrderDetails};
use crate::reconcile::{self, RefundOutcome};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/staff/orders/{id}", patch(update_order))
        .route("/staff/orders/{id}/status", patch(update_order_status))
        .route("/staff/orders/{id}/refund", post(refund_order))
        .layer(middleware::from_fn_with_state(state, staff_auth))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(input): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let conn = state.db.get()?;
    let order = fulfillment::advance_order(&conn, id, input.status)?;
    Ok(Json(order))
}

pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(input): Json<UpdateOrderDetails>,
) -> Result<Json<Order>> {
    if input.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }

    let conn = state.db.get()?;
    if let Some(order) = queries::update_order_details(&conn, id, &input)? {
        tracing::info!(order_id = %id, version = order.version, "Order details updated");
        return Ok(Json(order));
    }

    // Nothing matched: gone, or written since the editor read it.
    queries::get_order(&conn, id)?.or_not_found(msg::ORDER_NOT_FOUND)?;
    Err(AppError::Conflict(msg::ORDER_MODIFIED.into()))
}

/// Record that a paid order's money went back to the customer.
///
/// Repeating the call is harmless: an already refunded order is returned as is.
pub async fn refund_order(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let conn = state.db.get()?;
    match reconcile::refund_payment(&conn, id)? {
        RefundOutcome::Applied(order) | RefundOutcome::AlreadyRefunded(order) => Ok(Json(order)),
        RefundOutcome::NotPaid(_) => Err(AppError::Conflict(msg::ORDER_NOT_PAID.into())),
        RefundOutcome::OrderNotFound => Err(AppError::NotFound(msg::ORDER_NOT_FOUND.into())),
    }
}

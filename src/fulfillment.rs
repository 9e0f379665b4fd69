//! Staff-driven fulfillment progression.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::{AppError, OptionExt, Result, msg};
use crate::id::OrderId;
use crate::models::{Order, OrderStatus, PaymentStatus};

/// Move an order to `to` along the fulfillment graph.
///
/// Errors:
/// - `NotFound` if the order does not exist
/// - `BadRequest` if `to` is not reachable in one step from the current status
/// - `Conflict` if a forward step is attempted before payment, or another
///   writer changed the status between our read and our update
pub fn advance_order(conn: &Connection, id: OrderId, to: OrderStatus) -> Result<Order> {
    let current = queries::get_order(conn, id)?.or_not_found(msg::ORDER_NOT_FOUND)?;

    current
        .order_status
        .check_transition(to)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if to != OrderStatus::Cancelled && current.payment_status != PaymentStatus::Paid {
        return Err(AppError::Conflict(msg::PAYMENT_REQUIRED_FOR_PROGRESS.into()));
    }

    match queries::try_transition_order_status(conn, id, current.order_status, to)? {
        Some(order) => {
            tracing::info!(
                order_id = %id,
                from = %current.order_status,
                to = %order.order_status,
                "Order status updated"
            );
            Ok(order)
        }
        None => {
            // Distinguish a concurrent delete from a concurrent status change.
            queries::get_order(conn, id)?.or_not_found(msg::ORDER_NOT_FOUND)?;
            Err(AppError::Conflict(msg::STATUS_CHANGED.into()))
        }
    }
}

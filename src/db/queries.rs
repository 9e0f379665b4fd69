use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params, types::Value};

use crate::error::Result;
use crate::id::OrderId;
use crate::models::*;

use super::from_row::{FromRow, ORDER_COLS, query_all, query_one};

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query, optionally guarded on
/// the row's current version.
struct UpdateBuilder {
    table: &'static str,
    id: i64,
    fields: Vec<(&'static str, Value)>,
    track_updated_at: bool,
    expected_version: Option<i64>,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: i64) -> Self {
        Self {
            table,
            id,
            fields: Vec::new(),
            track_updated_at: false,
            expected_version: None,
        }
    }

    fn with_updated_at(mut self) -> Self {
        self.track_updated_at = true;
        self
    }

    /// Only update if `version` still equals `expected`, and bump it.
    fn with_version_check(mut self, expected: i64) -> Self {
        self.expected_version = Some(expected);
        self
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    /// Execute the update and return the updated row using RETURNING.
    /// Returns None if no rows matched or there was nothing to update.
    fn execute_returning<T: FromRow>(
        mut self,
        conn: &Connection,
        returning_cols: &str,
    ) -> Result<Option<T>> {
        if self.fields.is_empty() {
            return Ok(None);
        }
        if self.track_updated_at {
            self.fields.push(("updated_at", now().into()));
        }
        let mut sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());

        let mut condition = "id = ?".to_string();
        if let Some(expected) = self.expected_version {
            sets.push("version = version + 1".to_string());
            condition.push_str(" AND version = ?");
            values.push(expected.into());
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {} RETURNING {}",
            self.table,
            sets.join(", "),
            condition,
            returning_cols
        );
        conn.query_row(&sql, rusqlite::params_from_iter(values), T::from_row)
            .optional()
            .map_err(Into::into)
    }
}

// ============ Orders ============

/// Insert a provisional order in (awaiting_payment, new).
///
/// `default_currency` is used when the draft does not name one.
pub fn create_order(conn: &Connection, input: &CreateOrder, default_currency: &str) -> Result<Order> {
    let now = now();
    let currency = input
        .currency
        .as_deref()
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| default_currency.to_string());

    let order = conn.query_row(
        &format!(
            "INSERT INTO orders (customer_id, total_minor, currency, payment_status, order_status,
                                 product_link, quantity, shipping_mode, notes, attachment_url,
                                 created_at, updated_at)
             VALUES (?1, ?2, ?3, 'awaiting_payment', 'new', ?4, ?5, ?6, ?7, ?8, ?9, ?9)
             RETURNING {}",
            ORDER_COLS
        ),
        params![
            input.customer_id.trim(),
            input.total_minor,
            currency,
            input.product_link,
            input.quantity,
            input.shipping_mode.map(|m| m.as_str()),
            input.notes,
            input.attachment_url,
            now,
        ],
        Order::from_row,
    )?;
    Ok(order)
}

pub fn get_order(conn: &Connection, id: OrderId) -> Result<Option<Order>> {
    query_one(
        conn,
        &format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLS),
        &[&id],
    )
}

/// A customer's orders, newest first.
pub fn list_orders_for_customer(conn: &Connection, customer_id: &str) -> Result<Vec<Order>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM orders WHERE customer_id = ?1 ORDER BY id DESC",
            ORDER_COLS
        ),
        &[&customer_id],
    )
}

/// Atomically record a confirmed payment.
///
/// A single conditional update: `payment_status` goes `awaiting_payment -> paid`
/// and an order still in `new` moves to `processing`. Orders already past `new`
/// (e.g. cancelled while the payment was in flight) keep their fulfillment status.
///
/// Returns:
/// - `Ok(Some(order))` if this call applied the payment
/// - `Ok(None)` if the order does not exist or is no longer awaiting payment
pub fn try_mark_order_paid(conn: &Connection, id: OrderId) -> Result<Option<Order>> {
    let now = now();
    conn.query_row(
        &format!(
            "UPDATE orders
             SET payment_status = 'paid',
                 order_status = CASE WHEN order_status = 'new' THEN 'processing' ELSE order_status END,
                 paid_at = ?1,
                 updated_at = ?1,
                 version = version + 1
             WHERE id = ?2 AND payment_status = 'awaiting_payment'
             RETURNING {}",
            ORDER_COLS
        ),
        params![now, id],
        Order::from_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Atomically move a paid order to refunded.
///
/// Returns `Ok(None)` if the order does not exist or is not currently `paid`.
pub fn try_mark_order_refunded(conn: &Connection, id: OrderId) -> Result<Option<Order>> {
    conn.query_row(
        &format!(
            "UPDATE orders SET payment_status = 'refunded', updated_at = ?1, version = version + 1
             WHERE id = ?2 AND payment_status = 'paid'
             RETURNING {}",
            ORDER_COLS
        ),
        params![now(), id],
        Order::from_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Move `order_status` from `from` to `to`, only if it is still `from`.
///
/// Forward steps also require the order to be paid; cancellation does not.
/// The caller validates the edge itself (see `OrderStatus::check_transition`).
///
/// Returns `Ok(None)` if the order is missing or its state no longer matches.
pub fn try_transition_order_status(
    conn: &Connection,
    id: OrderId,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<Option<Order>> {
    let requires_payment = to != OrderStatus::Cancelled;
    conn.query_row(
        &format!(
            "UPDATE orders SET order_status = ?1, updated_at = ?2, version = version + 1
             WHERE id = ?3 AND order_status = ?4
               AND (?5 = 0 OR payment_status = 'paid')
             RETURNING {}",
            ORDER_COLS
        ),
        params![to.as_str(), now(), id, from.as_str(), requires_payment],
        Order::from_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Update free-form fulfillment details. Totals and statuses are not editable here.
///
/// Conditional on `input.version`. Returns `Ok(None)` if the order is missing
/// or has been written since that version was read.
pub fn update_order_details(
    conn: &Connection,
    id: OrderId,
    input: &UpdateOrderDetails,
) -> Result<Option<Order>> {
    UpdateBuilder::new("orders", id.get())
        .with_updated_at()
        .with_version_check(input.version)
        .set_opt("notes", input.notes.clone())
        .set_opt("attachment_url", input.attachment_url.clone())
        .set_opt("product_link", input.product_link.clone())
        .execute_returning(conn, ORDER_COLS)
}

/// Delete an order only while it is still awaiting payment.
///
/// Returns `Ok(true)` if a row was deleted.
pub fn delete_unpaid_order(conn: &Connection, id: OrderId) -> Result<bool> {
    let affected = conn.execute(
        "DELETE FROM orders WHERE id = ?1 AND payment_status = 'awaiting_payment'",
        params![id],
    )?;
    Ok(affected > 0)
}

//! Payment reconciliation.
//!
//! This module is the only writer of `payment_status`. Every write is a single
//! conditional statement keyed on the expected current status, so duplicate,
//! reordered, or concurrent deliveries of the same confirmation can apply it
//! at most once.

use rusqlite::Connection;

use crate::db::queries;
use crate::error::Result;
use crate::id::OrderId;
use crate::models::{Order, OrderStatus, PaymentStatus};

/// Result of applying one payment event to one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// This call performed the state change.
    Applied(Order),
    /// The change had already been made. Idempotent no-op.
    AlreadyApplied(Order),
    /// The decoded id has no order.
    OrderNotFound,
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Applied(_) => "applied",
            ReconcileOutcome::AlreadyApplied(_) => "already_applied",
            ReconcileOutcome::OrderNotFound => "order_not_found",
        }
    }
}

/// What the processor says it charged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimedCharge {
    /// Minor units.
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
}

impl ClaimedCharge {
    pub fn new(amount_minor: i64, currency: &str) -> Self {
        Self {
            amount_minor: Some(amount_minor),
            currency: Some(currency.to_string()),
        }
    }
}

/// A way a confirmed charge disagrees with the order it pays for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discrepancy {
    Amount { expected: i64, claimed: i64 },
    Currency { expected: String, claimed: String },
    MissingAmount,
    MissingCurrency,
}

/// Outcome of a refund request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefundOutcome {
    Applied(Order),
    AlreadyRefunded(Order),
    /// Still awaiting payment; there is nothing to refund.
    NotPaid(Order),
    OrderNotFound,
}

/// Record a confirmed payment for `order_id`.
///
/// `claim` is what the processor reports it charged. A mismatch against the
/// stored total or currency is logged but does not block the update: the
/// processor has already captured the money.
pub fn reconcile_payment(
    conn: &Connection,
    order_id: OrderId,
    claim: &ClaimedCharge,
) -> Result<ReconcileOutcome> {
    if let Some(order) = queries::try_mark_order_paid(conn, order_id)? {
        log_discrepancies(&order, claim);
        if order.order_status == OrderStatus::Cancelled {
            tracing::warn!(
                order_id = %order.id,
                "Payment confirmed for a cancelled order; refund needs operator follow-up"
            );
        }
        tracing::info!(
            order_id = %order.id,
            order_status = %order.order_status,
            "Payment applied"
        );
        return Ok(ReconcileOutcome::Applied(order));
    }

    // The guarded update matched nothing: either the order is gone or it has
    // already left awaiting_payment. Payment status never moves backward, so
    // an existing row here is necessarily paid or refunded.
    match queries::get_order(conn, order_id)? {
        Some(order) => {
            tracing::debug!(
                order_id = %order.id,
                payment_status = %order.payment_status,
                "Payment already applied"
            );
            Ok(ReconcileOutcome::AlreadyApplied(order))
        }
        None => {
            tracing::warn!(order_id = %order_id, "Payment confirmation for unknown order");
            Ok(ReconcileOutcome::OrderNotFound)
        }
    }
}

/// Move a paid order to refunded.
pub fn refund_payment(conn: &Connection, order_id: OrderId) -> Result<RefundOutcome> {
    if let Some(order) = queries::try_mark_order_refunded(conn, order_id)? {
        tracing::info!(order_id = %order.id, "Payment refunded");
        return Ok(RefundOutcome::Applied(order));
    }

    Ok(match queries::get_order(conn, order_id)? {
        Some(order) => match order.payment_status {
            PaymentStatus::Refunded => RefundOutcome::AlreadyRefunded(order),
            // Paid here means the confirmation landed between the guarded
            // update and this read; the request predates the payment.
            PaymentStatus::AwaitingPayment | PaymentStatus::Paid => RefundOutcome::NotPaid(order),
        },
        None => RefundOutcome::OrderNotFound,
    })
}

/// Compare a claimed charge with the stored order. Currency codes compare
/// case-insensitively; orders store them uppercased.
pub fn discrepancies(order: &Order, claim: &ClaimedCharge) -> Vec<Discrepancy> {
    let mut found = Vec::new();

    match claim.amount_minor {
        Some(claimed) if claimed != order.total_minor => found.push(Discrepancy::Amount {
            expected: order.total_minor,
            claimed,
        }),
        Some(_) => {}
        None => found.push(Discrepancy::MissingAmount),
    }

    match claim.currency.as_deref() {
        Some(claimed) if !claimed.eq_ignore_ascii_case(&order.currency) => {
            found.push(Discrepancy::Currency {
                expected: order.currency.clone(),
                claimed: claimed.to_string(),
            })
        }
        Some(_) => {}
        None => found.push(Discrepancy::MissingCurrency),
    }

    found
}

fn log_discrepancies(order: &Order, claim: &ClaimedCharge) {
    for discrepancy in discrepancies(order, claim) {
        match discrepancy {
            Discrepancy::Amount { expected, claimed } => tracing::error!(
                order_id = %order.id,
                expected,
                claimed,
                "Confirmed amount does not match order total"
            ),
            Discrepancy::Currency { expected, claimed } => tracing::error!(
                order_id = %order.id,
                expected = %expected,
                claimed = %claimed,
                "Confirmed currency does not match order currency"
            ),
            Discrepancy::MissingAmount => {
                tracing::warn!(order_id = %order.id, "Payment confirmation carried no amount")
            }
            Discrepancy::MissingCurrency => {
                tracing::warn!(order_id = %order.id, "Payment confirmation carried no currency")
            }
        }
    }
}

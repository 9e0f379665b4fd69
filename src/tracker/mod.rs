//! Client-side payment intent tracking.
//!
//! Drives one checkout attempt from the customer's side: create the order,
//! hand its reference to hosted checkout, then read the order back from the
//! server. The checkout widget's own success or close callback is never
//! treated as proof of payment. Only the stored `payment_status`, written by
//! the webhook, decides whether a payment is confirmed.

mod http;

pub use http::HttpOrderBackend;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::id::OrderId;
use crate::models::{CheckoutIntent, CreateOrder, Order, OrderStatus, PaymentStatus};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("order {0} is not awaiting payment")]
    NotPayable(OrderId),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

/// Where orders live. The HTTP implementation talks to this service's
/// order endpoints; tests substitute an in-memory one.
pub trait OrderBackend: Send + Sync {
    /// Create a provisional order and get its checkout details.
    fn create_order(
        &self,
        draft: &CreateOrder,
    ) -> impl Future<Output = Result<CheckoutIntent>> + Send;

    /// Checkout details for an existing order that is still unpaid.
    fn resume_checkout(&self, id: OrderId) -> impl Future<Output = Result<CheckoutIntent>> + Send;

    /// Authoritative order state. `Ok(None)` if the order does not exist.
    fn fetch_order(&self, id: OrderId) -> impl Future<Output = Result<Option<Order>>> + Send;
}

/// What hosted checkout is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub reference: String,
    pub amount_minor: i64,
    pub currency: String,
    pub callback_url: String,
}

/// How the hosted checkout widget said it finished. Informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutReport {
    /// The widget reported a successful charge for this reference.
    Succeeded { reference: String },
    /// The customer closed the widget without a success callback.
    Closed,
}

/// The processor's hosted checkout UI.
pub trait HostedCheckout: Send + Sync {
    fn open(&self, request: &CheckoutRequest) -> impl Future<Output = CheckoutReport> + Send;
}

/// A checkout attempt waiting for the customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPayment {
    pub order_id: OrderId,
    pub reference: String,
    pub amount_minor: i64,
    pub currency: String,
    pub callback_url: String,
}

impl PendingPayment {
    pub fn checkout_request(&self) -> CheckoutRequest {
        CheckoutRequest {
            reference: self.reference.clone(),
            amount_minor: self.amount_minor,
            currency: self.currency.clone(),
            callback_url: self.callback_url.clone(),
        }
    }
}

impl From<CheckoutIntent> for PendingPayment {
    fn from(intent: CheckoutIntent) -> Self {
        Self {
            order_id: intent.order.id,
            reference: intent.reference,
            amount_minor: intent.amount_minor,
            currency: intent.currency,
            callback_url: intent.callback_url,
        }
    }
}

/// What to show the customer, derived from stored order state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentView {
    /// The webhook has recorded the payment.
    Confirmed(Order),
    /// Checkout reported success but the payment is not recorded yet.
    AwaitingConfirmation(Order),
    /// Checkout was closed and no payment is recorded.
    NotCompleted(Order),
    Refunded(Order),
    /// The order no longer exists (deleted before payment).
    Missing(OrderId),
}

impl PaymentView {
    /// Derive the view from an order read back from the server.
    ///
    /// `report` only chooses between the two not-yet-paid wordings.
    pub fn from_order(order: Order, report: &CheckoutReport) -> Self {
        match order.payment_status {
            PaymentStatus::Paid => PaymentView::Confirmed(order),
            PaymentStatus::Refunded => PaymentView::Refunded(order),
            PaymentStatus::AwaitingPayment => match report {
                CheckoutReport::Succeeded { .. } if order.order_status != OrderStatus::Cancelled => {
                    PaymentView::AwaitingConfirmation(order)
                }
                _ => PaymentView::NotCompleted(order),
            },
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, PaymentView::Confirmed(_))
    }

    pub fn message(&self) -> &'static str {
        match self {
            PaymentView::Confirmed(_) => "Payment confirmed. Your order is being processed.",
            PaymentView::AwaitingConfirmation(_) => {
                "Payment not yet confirmed. We will update your order as soon as it is."
            }
            PaymentView::NotCompleted(_) => {
                "Payment was not completed. You can pay later from your orders."
            }
            PaymentView::Refunded(_) => "This payment has been refunded.",
            PaymentView::Missing(_) => "This order no longer exists.",
        }
    }
}

pub struct PaymentIntentTracker<B> {
    backend: B,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl<B: OrderBackend> PaymentIntentTracker<B> {
    /// A tracker that reads the order once after checkout and does not poll.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            poll_attempts: 0,
            poll_interval: Duration::from_secs(2),
        }
    }

    /// Keep re-reading up to `attempts` times while a reported success has
    /// not been confirmed yet.
    pub fn with_polling(mut self, attempts: u32, interval: Duration) -> Self {
        self.poll_attempts = attempts;
        self.poll_interval = interval;
        self
    }

    /// Create the order. It must exist before checkout opens, so that the
    /// webhook always has a row to update.
    pub async fn start(&self, draft: &CreateOrder) -> Result<PendingPayment> {
        let intent = self.backend.create_order(draft).await?;
        tracing::debug!(
            order_id = %intent.order.id,
            reference = %intent.reference,
            "Order created for checkout"
        );
        Ok(intent.into())
    }

    /// Prepare a new checkout attempt for an unpaid order, reusing its reference.
    pub async fn resume(&self, order_id: OrderId) -> Result<PendingPayment> {
        let intent = self.backend.resume_checkout(order_id).await?;
        if !intent.order.is_awaiting_payment() {
            return Err(TrackerError::NotPayable(order_id));
        }
        Ok(intent.into())
    }

    /// Resolve a finished checkout attempt against stored state.
    ///
    /// Always re-reads the order, whichever way checkout reported.
    pub async fn settle(
        &self,
        pending: &PendingPayment,
        report: &CheckoutReport,
    ) -> Result<PaymentView> {
        if let CheckoutReport::Succeeded { reference } = report {
            if reference != &pending.reference {
                tracing::warn!(
                    expected = %pending.reference,
                    reported = %reference,
                    "Checkout reported success for a different reference"
                );
            }
        }

        let view = match self.backend.fetch_order(pending.order_id).await? {
            Some(order) => PaymentView::from_order(order, report),
            None => PaymentView::Missing(pending.order_id),
        };
        tracing::debug!(order_id = %pending.order_id, view = view_name(&view), "Checkout settled");
        Ok(view)
    }

    /// Poll until the order leaves `awaiting_payment` or attempts run out.
    pub async fn await_confirmation(&self, pending: &PendingPayment) -> Result<PaymentView> {
        let report = CheckoutReport::Succeeded {
            reference: pending.reference.clone(),
        };
        let view = self.settle(pending, &report).await?;
        self.poll_while_unconfirmed(pending, &report, view).await
    }

    async fn poll_while_unconfirmed(
        &self,
        pending: &PendingPayment,
        report: &CheckoutReport,
        mut view: PaymentView,
    ) -> Result<PaymentView> {
        for _ in 0..self.poll_attempts {
            if !matches!(view, PaymentView::AwaitingConfirmation(_)) {
                break;
            }
            tokio::time::sleep(self.poll_interval).await;
            view = self.settle(pending, report).await?;
        }
        Ok(view)
    }

    /// Run one attempt end to end: create, open checkout, read back.
    pub async fn checkout<C: HostedCheckout>(
        &self,
        draft: &CreateOrder,
        checkout: &C,
    ) -> Result<PaymentView> {
        let pending = self.start(draft).await?;
        self.run_checkout(&pending, checkout).await
    }

    /// "Pay Now" for an order created earlier and never paid.
    pub async fn pay_now<C: HostedCheckout>(
        &self,
        order_id: OrderId,
        checkout: &C,
    ) -> Result<PaymentView> {
        let pending = self.resume(order_id).await?;
        self.run_checkout(&pending, checkout).await
    }

    async fn run_checkout<C: HostedCheckout>(
        &self,
        pending: &PendingPayment,
        checkout: &C,
    ) -> Result<PaymentView> {
        let report = checkout.open(&pending.checkout_request()).await;
        let view = self.settle(pending, &report).await?;
        self.poll_while_unconfirmed(pending, &report, view).await
    }
}

fn view_name(view: &PaymentView) -> &'static str {
    match view {
        PaymentView::Confirmed(_) => "confirmed",
        PaymentView::AwaitingConfirmation(_) => "awaiting_confirmation",
        PaymentView::NotCompleted(_) => "not_completed",
        PaymentView::Refunded(_) => "refunded",
        PaymentView::Missing(_) => "missing",
    }
}

use serde::{Deserialize, Serialize};

use crate::id::OrderId;

use super::{OrderStatus, PaymentStatus};

/// How a link-purchase order travels to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMode {
    Air,
    Sea,
}

impl ShippingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingMode::Air => "air",
            ShippingMode::Sea => "sea",
        }
    }
}

impl std::str::FromStr for ShippingMode {
    type Err = super::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "air" => Ok(ShippingMode::Air),
            "sea" => Ok(ShippingMode::Sea),
            _ => Err(super::ParseEnumError(s.to_string())),
        }
    }
}

/// A customer order. `total_minor` is fixed at creation and never rewritten;
/// payment confirmations are checked against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: String,
    /// Total in minor currency units (pesewas for GHS).
    pub total_minor: i64,
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub product_link: Option<String>,
    pub quantity: Option<i64>,
    pub shipping_mode: Option<ShippingMode>,
    pub notes: Option<String>,
    pub attachment_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Set once, when the processor's confirmation is applied.
    pub paid_at: Option<i64>,
    /// Incremented by every write to the row.
    pub version: i64,
}

impl Order {
    pub fn is_awaiting_payment(&self) -> bool {
        self.payment_status == PaymentStatus::AwaitingPayment
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub customer_id: String,
    pub total_minor: i64,
    /// Falls back to the service's configured currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_mode: Option<ShippingMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

impl CreateOrder {
    /// Minimal draft used by fixtures and the dev seed.
    pub fn new(customer_id: impl Into<String>, total_minor: i64) -> Self {
        Self {
            customer_id: customer_id.into(),
            total_minor,
            currency: None,
            product_link: None,
            quantity: None,
            shipping_mode: None,
            notes: None,
            attachment_url: None,
        }
    }
}

/// Staff edits to fulfillment details. `None` leaves a field untouched.
///
/// `version` is the order version the editor last read. The edit is refused
/// if anyone has written the order since.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateOrderDetails {
    pub version: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub attachment_url: Option<String>,
    #[serde(default)]
    pub product_link: Option<String>,
}

impl UpdateOrderDetails {
    pub fn is_empty(&self) -> bool {
        self.notes.is_none() && self.attachment_url.is_none() && self.product_link.is_none()
    }
}

/// What the client needs to open hosted checkout for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutIntent {
    pub order: Order,
    pub reference: String,
    pub amount_minor: i64,
    pub currency: String,
    /// Where hosted checkout sends the customer afterwards.
    pub callback_url: String,
}

use serde::Deserialize;
use serde_json::Value;

/// The only event that changes order state.
pub const CHARGE_SUCCESS: &str = "charge.success";

/// Webhook envelope.
///
/// `data` is kept raw: its shape depends on the event, and events other than
/// `charge.success` must be acknowledged whatever they carry.
#[derive(Debug, Deserialize)]
pub struct PaystackWebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// The part of a `charge.success` payload reconciliation reads. The processor
/// sends many more fields, which serde ignores.
#[derive(Debug, Deserialize)]
pub struct PaystackChargeData {
    pub reference: String,
    /// Charged amount in minor units (pesewas, kobo, cents).
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl PaystackWebhookEvent {
    pub fn is_charge_success(&self) -> bool {
        self.event == CHARGE_SUCCESS
    }

    /// Decode `data` as a charge. `Ok(None)` when the event has no data.
    pub fn charge_data(self) -> serde_json::Result<Option<PaystackChargeData>> {
        if self.data.is_null() {
            return Ok(None);
        }
        serde_json::from_value(self.data).map(Some)
    }
}

pub mod paystack;

pub use paystack::handle_paystack_webhook;

use axum::{Router, http::StatusCode, routing::post};

use crate::db::AppState;

/// Status and short plain-text body. The processor only looks at the status.
pub type WebhookResult = (StatusCode, &'static str);

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook/paystack", post(handle_paystack_webhook))
}

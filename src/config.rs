use std::env;

use thiserror::Error;

/// Namespace used in payment references when none is configured.
pub const DEFAULT_REFERENCE_PREFIX: &str = "C2G-ORDER";

/// Startup configuration problems. Anything here means the affected surface
/// must refuse to run rather than fall back to a guess.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub base_url: String,
    /// Shared secret for processor webhook signatures. Never defaulted.
    pub paystack_webhook_secret: Option<String>,
    pub reference_prefix: String,
    pub currency: String,
    /// Bearer token for the staff API. Staff routes reject everything when unset.
    pub staff_api_key: Option<String>,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("ORDERFLOW_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", host, port));

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "orderflow.db".to_string()),
            base_url,
            paystack_webhook_secret: non_empty_var("PAYSTACK_WEBHOOK_SECRET"),
            reference_prefix: non_empty_var("ORDER_REFERENCE_PREFIX")
                .unwrap_or_else(|| DEFAULT_REFERENCE_PREFIX.to_string()),
            currency: non_empty_var("ORDER_CURRENCY").unwrap_or_else(|| "GHS".to_string()),
            staff_api_key: non_empty_var("STAFF_API_KEY"),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Treat a blank variable the same as an unset one.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

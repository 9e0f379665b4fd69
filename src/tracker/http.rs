use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;

use crate::id::OrderId;
use crate::models::{CheckoutIntent, CreateOrder, Order};

use super::{OrderBackend, Result, TrackerError};

/// Order backend that talks to the orderflow HTTP API.
#[derive(Debug, Clone)]
pub struct HttpOrderBackend {
    base_url: String,
    http: HttpClient,
}

impl HttpOrderBackend {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, HttpClient::new())
    }

    pub fn with_client(base_url: &str, http: HttpClient) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status().as_u16();

        if !response.status().is_success() {
            #[derive(Deserialize)]
            struct ErrorResponse {
                error: Option<String>,
                details: Option<String>,
            }

            let error_body: ErrorResponse = response.json().await.unwrap_or(ErrorResponse {
                error: None,
                details: None,
            });

            let message = match (error_body.error, error_body.details) {
                (Some(err), Some(details)) => format!("{}: {}", err, details),
                (Some(err), None) => err,
                (None, Some(details)) => details,
                (None, None) => format!("Request failed: {}", status),
            };
            return Err(TrackerError::Api { status, message });
        }

        response
            .json()
            .await
            .map_err(|e| TrackerError::Network(e.to_string()))
    }
}

impl OrderBackend for HttpOrderBackend {
    async fn create_order(&self, draft: &CreateOrder) -> Result<CheckoutIntent> {
        let response = self
            .http
            .post(self.url("/orders"))
            .json(draft)
            .send()
            .await
            .map_err(|e| TrackerError::Network(e.to_string()))?;

        Self::handle_response(response).await
    }

    async fn resume_checkout(&self, id: OrderId) -> Result<CheckoutIntent> {
        let response = self
            .http
            .get(self.url(&format!("/orders/{}/checkout", id)))
            .send()
            .await
            .map_err(|e| TrackerError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::CONFLICT => Err(TrackerError::NotPayable(id)),
            _ => Self::handle_response(response).await,
        }
    }

    async fn fetch_order(&self, id: OrderId) -> Result<Option<Order>> {
        let response = self
            .http
            .get(self.url(&format!("/orders/{}", id)))
            .send()
            .await
            .map_err(|e| TrackerError::Network(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::handle_response(response).await.map(Some)
    }
}

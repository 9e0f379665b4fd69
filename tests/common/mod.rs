//! Test utilities and fixtures for orderflow integration tests

#![allow(dead_code)]

use axum::Router;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use tempfile::TempDir;

pub use axum::body::Body;
pub use axum::http::{Request, StatusCode};
pub use tower::ServiceExt;

pub use orderflow::db::{AppState, create_pool, init_db, queries};
pub use orderflow::id::OrderId;
pub use orderflow::models::*;
pub use orderflow::payments::{ReferenceCodec, SIGNATURE_HEADER, SignatureVerifier};

pub const TEST_WEBHOOK_SECRET: &str = "sk_test_3f9c2a7e51d04b8e";
pub const TEST_STAFF_KEY: &str = "staff_test_key_0123456789";
pub const TEST_PREFIX: &str = "C2G-ORDER";
pub const TEST_CURRENCY: &str = "GHS";

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// App state backed by a file database in a temp directory.
///
/// Pooled connections to `:memory:` would each see their own empty database,
/// so handler tests use a real file. Keep the `TempDir` alive for the test.
pub struct TestApp {
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    pub fn router(&self) -> Router {
        orderflow::handlers::router(self.state.clone())
    }

    pub fn conn(&self) -> r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager> {
        self.state.db.get().expect("Failed to get connection")
    }

    pub fn codec(&self) -> &ReferenceCodec {
        &self.state.references
    }
}

fn build_test_app(webhook_secret: Option<&str>, staff_key: Option<&str>) -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("orderflow_test.db");
    let pool = create_pool(path.to_str().expect("utf-8 temp path")).expect("Failed to create pool");
    {
        let conn = pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize schema");
    }

    TestApp {
        state: AppState {
            db: pool,
            webhook_verifier: SignatureVerifier::new(webhook_secret).ok(),
            references: ReferenceCodec::new(TEST_PREFIX).expect("valid prefix"),
            currency: TEST_CURRENCY.to_string(),
            staff_api_key: staff_key.map(String::from),
            base_url: "http://localhost:3000".to_string(),
        },
        _dir: dir,
    }
}

/// Fully configured app: webhook secret and staff key set.
pub fn create_test_app() -> TestApp {
    build_test_app(Some(TEST_WEBHOOK_SECRET), Some(TEST_STAFF_KEY))
}

/// App whose webhook secret was never configured.
pub fn create_test_app_without_secret() -> TestApp {
    build_test_app(None, Some(TEST_STAFF_KEY))
}

/// App whose staff key was never configured.
pub fn create_test_app_without_staff_key() -> TestApp {
    build_test_app(Some(TEST_WEBHOOK_SECRET), None)
}

/// Create an order in (awaiting_payment, new)
pub fn create_test_order(conn: &Connection, total_minor: i64) -> Order {
    queries::create_order(conn, &CreateOrder::new("cust_test", total_minor), TEST_CURRENCY)
        .expect("Failed to create test order")
}

/// Create an order and confirm its payment
pub fn create_paid_order(conn: &Connection, total_minor: i64) -> Order {
    let order = create_test_order(conn, total_minor);
    queries::try_mark_order_paid(conn, order.id)
        .expect("mark paid should not error")
        .expect("fresh order should be markable as paid")
}

pub fn order_id(n: i64) -> OrderId {
    OrderId::new(n).expect("positive id")
}

pub fn compute_paystack_signature(payload: &[u8], secret: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha512;

    type HmacSha512 = Hmac<Sha512>;

    let mut mac =
        HmacSha512::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

pub fn charge_success_payload(reference: &str, amount: i64) -> String {
    serde_json::json!({
        "event": "charge.success",
        "data": {
            "id": 4099260516u64,
            "status": "success",
            "reference": reference,
            "amount": amount,
            "currency": "GHS",
            "channel": "mobile_money",
            "customer": {"email": "ama@example.com"}
        }
    })
    .to_string()
}

/// A webhook request signed with the test secret
pub fn signed_webhook_request(payload: &str) -> Request<Body> {
    let signature = compute_paystack_signature(payload.as_bytes(), TEST_WEBHOOK_SECRET);
    Request::builder()
        .method("POST")
        .uri("/webhook/paystack")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(payload.to_string()))
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

pub async fn body_json<T: DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

mod from_row;
mod schema;
pub mod queries;

pub use from_row::{FromRow, ORDER_COLS};
pub use schema::init_db;

use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::payments::{ReferenceCodec, SignatureVerifier};

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// `None` when the webhook secret is not configured; the webhook endpoint
    /// then answers 500 to every delivery.
    pub webhook_verifier: Option<SignatureVerifier>,
    pub references: ReferenceCodec,
    /// Currency assigned to orders that do not name one.
    pub currency: String,
    /// Staff bearer token. `None` locks the staff API entirely.
    pub staff_api_key: Option<String>,
    /// Base URL for checkout return links (e.g., https://orders.example.com)
    pub base_url: String,
}

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-connection setup: WAL so readers don't block the single writer, and a
/// busy timeout so concurrent conditional updates queue instead of failing.
fn init_connection(conn: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    Ok(())
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path).with_init(init_connection);
    Pool::builder().max_size(10).build(manager)
}

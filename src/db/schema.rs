use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Orders
        -- AUTOINCREMENT: ids are strictly increasing and never reused, so a
        -- payment reference can never point at a different order later.
        -- total_minor: minor currency units (pesewas), written once at insert.
        -- payment_status is only changed by payment reconciliation.
        -- version: bumped by every update; staff edits are conditional on it.
        CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id TEXT NOT NULL,
            total_minor INTEGER NOT NULL CHECK (total_minor >= 0),
            currency TEXT NOT NULL,
            payment_status TEXT NOT NULL DEFAULT 'awaiting_payment'
                CHECK (payment_status IN ('awaiting_payment', 'paid', 'refunded')),
            order_status TEXT NOT NULL DEFAULT 'new'
                CHECK (order_status IN ('new', 'processing', 'purchased', 'in_transit', 'delivered', 'cancelled')),
            product_link TEXT,
            quantity INTEGER CHECK (quantity IS NULL OR quantity > 0),
            shipping_mode TEXT CHECK (shipping_mode IS NULL OR shipping_mode IN ('air', 'sea')),
            notes TEXT,
            attachment_url TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            paid_at INTEGER,
            version INTEGER NOT NULL DEFAULT 1
        );
        CREATE INDEX IF NOT EXISTS idx_orders_customer ON orders(customer_id, id DESC);
        CREATE INDEX IF NOT EXISTS idx_orders_payment_status ON orders(payment_status);
        "#,
    )?;
    Ok(())
}

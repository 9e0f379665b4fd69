//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to rusqlite errors.
///
/// A bad value in the table surfaces as a query error instead of a panic.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

fn parse_optional_enum<T: std::str::FromStr>(
    row: &Row,
    col: usize,
    col_name: &str,
) -> rusqlite::Result<Option<T>> {
    match row.get::<_, Option<String>>(col)? {
        Some(s) => s.parse::<T>().map(Some).map_err(|_| {
            rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
        }),
        None => Ok(None),
    }
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub const ORDER_COLS: &str = "id, customer_id, total_minor, currency, payment_status, order_status, product_link, quantity, shipping_mode, notes, attachment_url, created_at, updated_at, paid_at, version";

impl FromRow for Order {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Order {
            id: row.get(0)?,
            customer_id: row.get(1)?,
            total_minor: row.get(2)?,
            currency: row.get(3)?,
            payment_status: parse_enum(row, 4, "payment_status")?,
            order_status: parse_enum(row, 5, "order_status")?,
            product_link: row.get(6)?,
            quantity: row.get(7)?,
            shipping_mode: parse_optional_enum(row, 8, "shipping_mode")?,
            notes: row.get(9)?,
            attachment_url: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
            paid_at: row.get(13)?,
            version: row.get(14)?,
        })
    }
}

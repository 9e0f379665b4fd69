//! Order identifiers.
//!
//! Orders are keyed by a positive integer assigned by the database
//! (`INTEGER PRIMARY KEY AUTOINCREMENT`), so ids only ever grow and are never
//! reused. The same id is embedded in payment references, which means the
//! textual form must round-trip exactly: `42` parses, `042`, `+42` and `4_2`
//! do not.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Positive order id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct OrderId(i64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderIdError {
    #[error("order id must be a positive integer")]
    NotPositive,
    #[error("order id must be canonical decimal digits")]
    NotCanonical,
    #[error("order id is out of range")]
    OutOfRange,
}

impl OrderId {
    pub fn new(value: i64) -> Result<Self, OrderIdError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(OrderIdError::NotPositive)
        }
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

/// Check that a string is the canonical decimal form of a positive integer:
/// ASCII digits only, no sign, no leading zero.
pub fn is_canonical_decimal(s: &str) -> bool {
    !s.is_empty() && !s.starts_with('0') && s.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for OrderId {
    type Err = OrderIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "0" {
            return Err(OrderIdError::NotPositive);
        }
        if !is_canonical_decimal(s) {
            return Err(OrderIdError::NotCanonical);
        }
        let value: i64 = s.parse().map_err(|_| OrderIdError::OutOfRange)?;
        Self::new(value)
    }
}

impl TryFrom<i64> for OrderId {
    type Error = OrderIdError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OrderId> for i64 {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for OrderId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for OrderId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i64::column_result(value)?;
        OrderId::new(raw).map_err(|_| FromSqlError::OutOfRange(raw))
    }
}

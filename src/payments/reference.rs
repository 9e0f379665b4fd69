//! Payment reference codec.
//!
//! A reference is the string handed to the processor at checkout and echoed
//! back in the webhook, e.g. `C2G-ORDER-42`. It is `{prefix}-{order id}`.
//! The prefix may itself contain `-`, so decoding splits on the last one.

use thiserror::Error;

use crate::config::ConfigError;
use crate::id::OrderId;

const DELIMITER: char = '-';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("reference has no order id segment")]
    MissingDelimiter,
    #[error("reference namespace does not match")]
    ForeignNamespace,
    #[error("reference order id is not a positive integer")]
    InvalidOrderId,
}

#[derive(Debug, Clone)]
pub struct ReferenceCodec {
    prefix: String,
}

impl ReferenceCodec {
    /// Build a codec for a namespace prefix.
    ///
    /// The prefix must be non-empty and use only characters the processor
    /// accepts in references (`A-Z a-z 0-9 . = -`). It must not end in the
    /// delimiter, or encoded references would contain `--`.
    pub fn new(prefix: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid {
            name: "ORDER_REFERENCE_PREFIX",
            reason: reason.to_string(),
        };

        if prefix.is_empty() {
            return Err(ConfigError::Missing("ORDER_REFERENCE_PREFIX"));
        }
        if !prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '=' | '-'))
        {
            return Err(invalid("only A-Z, a-z, 0-9, '.', '=' and '-' are allowed"));
        }
        if prefix.ends_with(DELIMITER) || prefix.starts_with(DELIMITER) {
            return Err(invalid("must not start or end with '-'"));
        }

        Ok(Self {
            prefix: prefix.to_string(),
        })
    }

    pub fn encode(&self, id: OrderId) -> String {
        format!("{}{}{}", self.prefix, DELIMITER, id)
    }

    /// Recover the order id from a reference produced by [`encode`](Self::encode).
    pub fn decode(&self, reference: &str) -> Result<OrderId, ReferenceError> {
        let (namespace, id) = reference
            .rsplit_once(DELIMITER)
            .ok_or(ReferenceError::MissingDelimiter)?;

        if namespace != self.prefix {
            return Err(ReferenceError::ForeignNamespace);
        }

        id.parse().map_err(|_| ReferenceError::InvalidOrderId)
    }
}

//! Webhook signature verification.
//!
//! The processor signs every delivery with HMAC-SHA512 over the raw request
//! body, keyed by the account's secret, and sends the digest as lowercase hex
//! in `x-paystack-signature`. Verification must run over the exact bytes
//! received: re-serialized JSON will not match.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha512;
use subtle::ConstantTimeEq;

use crate::config::ConfigError;

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

const DIGEST_LEN: usize = 64;

/// Holds the keyed MAC state; each check works on a clone of it.
#[derive(Clone)]
pub struct SignatureVerifier {
    keyed: HmacSha512,
}

impl fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl SignatureVerifier {
    /// Build a verifier from the configured secret.
    ///
    /// A missing or empty secret is a configuration error. There is no
    /// fallback key.
    pub fn new(secret: Option<&str>) -> Result<Self, ConfigError> {
        match secret {
            Some(s) if !s.is_empty() => {
                let keyed = HmacSha512::new_from_slice(s.as_bytes()).map_err(|e| {
                    ConfigError::Invalid {
                        name: "PAYSTACK_WEBHOOK_SECRET",
                        reason: e.to_string(),
                    }
                })?;
                Ok(Self { keyed })
            }
            _ => Err(ConfigError::Missing("PAYSTACK_WEBHOOK_SECRET")),
        }
    }

    fn mac(&self, raw_body: &[u8]) -> HmacSha512 {
        let mut mac = self.keyed.clone();
        mac.update(raw_body);
        mac
    }

    /// Hex signature the processor would send for `raw_body`.
    pub fn sign(&self, raw_body: &[u8]) -> String {
        hex::encode(self.mac(raw_body).finalize().into_bytes())
    }

    /// Check a claimed signature against the raw body.
    ///
    /// The header must be the bare hex digest. Absent, padded, non-hex or
    /// wrong-length claims are simply `false`.
    pub fn verify(&self, raw_body: &[u8], claimed: Option<&str>) -> bool {
        let Some(claimed) = claimed else {
            return false;
        };
        let Ok(claimed) = hex::decode(claimed) else {
            return false;
        };
        // Digest length is public, so this early return leaks nothing.
        if claimed.len() != DIGEST_LEN {
            return false;
        }

        let expected = self.mac(raw_body).finalize().into_bytes();
        expected.as_slice().ct_eq(&claimed).into()
    }
}

//! Webhook HMAC verification.
//!
//! Inbound provider callbacks are signed with HMAC-SHA256 over the raw
//! request body, delivered as `sha256=<hex>` in one of two headers
//! (providers have shipped both spellings). Verification is constant-time
//! and happens before any body parsing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Header names checked for the webhook signature, in order.
pub const SIGNATURE_HEADERS: &[&str] = &["webhook-signature", "x-replicate-signature"];

/// Prefix carried by the signature header value.
const SIGNATURE_PREFIX: &str = "sha256=";

type HmacSha256 = Hmac<Sha256>;

/// Compute the signature header value for a payload: `sha256=<hex(hmac)>`.
pub fn compute_signature(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

/// Verify a signature header value against the raw body.
///
/// Accepts the value with or without the `sha256=` prefix. Returns `false`
/// for malformed hex; comparison is constant-time via the HMAC primitive.
pub fn verify_signature(secret: &str, body: &[u8], header_value: &str) -> bool {
    let hex_part = header_value
        .trim()
        .strip_prefix(SIGNATURE_PREFIX)
        .unwrap_or_else(|| header_value.trim());

    let Some(sig_bytes) = hex::decode(hex_part) else {
        return false;
    };

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    mac.verify_slice(&sig_bytes).is_ok()
}

// ---------------------------------------------------------------------------
// hex helpers (no extra dep)
// ---------------------------------------------------------------------------

mod hex {
    /// Encode bytes as a lowercase hex string.
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Decode a hex string into bytes; `None` on odd length or bad digits.
    pub fn decode(hex: &str) -> Option<Vec<u8>> {
        if hex.len() % 2 != 0 {
            return None;
        }
        (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! LINE webhook signature verification.
//!
//! LINE signs each webhook delivery with HMAC-SHA256 over the raw request body,
//! keyed by the channel secret, and sends the base64 digest in `X-Line-Signature`.
//! Verification must run against the body bytes exactly as received.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Compute the expected `X-Line-Signature` value for a request body.
pub fn compute(channel_secret: &str, body: &[u8]) -> Option<String> {
    let Ok(mut mac) = HmacSha256::new_from_slice(channel_secret.as_bytes()) else {
        return None;
    };
    mac.update(body);
    Some(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}

/// True when the header value matches the computed signature (constant-time compare).
pub fn verify(channel_secret: &str, body: &[u8], header_value: &str) -> bool {
    let Some(expected) = compute(channel_secret, body) else {
        return false;
    };
    expected.as_bytes().ct_eq(header_value.as_bytes()).into()
}

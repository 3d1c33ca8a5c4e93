//! HMAC-SHA256 request signing for outbound webhook calls.
//!
//! The signed message is `"{timestamp}.{body}"`, so a receiver that checks the
//! timestamp header against its own clock can reject replayed requests. The
//! header value has the form `sha256=<lowercase hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const TIMESTAMP_HEADER: &str = "x-webhook-timestamp";
pub const DELIVERY_ID_HEADER: &str = "x-webhook-id";
pub const EVENT_HEADER: &str = "x-webhook-event";

const SIGNATURE_SCHEME: &str = "sha256=";

fn mac_for(secret: &str, timestamp: i64, body: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length, so construction cannot fail.
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("hmac accepts any key length"),
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    mac
}

/// Compute the signature header value for `body` sent at `timestamp`.
pub fn sign(secret: &str, timestamp: i64, body: &[u8]) -> String {
    let digest = mac_for(secret, timestamp, body).finalize().into_bytes();
    format!("{SIGNATURE_SCHEME}{}", hex::encode(digest))
}

/// Check a received signature header in constant time.
pub fn verify(secret: &str, timestamp: i64, body: &[u8], header_value: &str) -> bool {
    let Some(expected_hex) = header_value.trim().strip_prefix(SIGNATURE_SCHEME) else {
        return false;
    };
    let Ok(expected) = hex::decode(expected_hex) else {
        return false;
    };
    mac_for(secret, timestamp, body)
        .verify_slice(&expected)
        .is_ok()
}

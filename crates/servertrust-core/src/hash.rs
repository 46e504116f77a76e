//! SHA-256 digests via `ring::digest`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ring::digest::{digest, SHA256};

/// Compute SHA-256 of raw bytes (certificate DER, SPKI DER).
///
/// Returns lowercase hex-encoded digest.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(digest(&SHA256, data).as_ref())
}

/// Compute SHA-256 of raw bytes, base64-encoded as used by HTTP public key pins.
#[must_use]
pub fn sha256_base64(data: &[u8]) -> String {
    STANDARD.encode(digest(&SHA256, data).as_ref())
}

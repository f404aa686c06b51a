//! Opaque refresh token values.
//!
//! A refresh token is 32 bytes from the operating system RNG, encoded as unpadded
//! base64url. The value is the bearer credential itself, so only its SHA-256 digest is
//! ever persisted; a leaked database row cannot be replayed.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

pub const REFRESH_TOKEN_BYTES: usize = 32;

pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Storage key for a refresh token value (lowercase hex SHA-256).
pub fn hash_refresh_token(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

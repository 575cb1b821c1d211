//! Opaque secrets handed to clients and the digests stored in their place.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use standup_core::error::AppError;

/// Number of random bytes in every handle and token.
pub const SECRET_BYTES: usize = 32;

/// Generate a 256-bit secret from the OS RNG, base64url-encoded without padding.
pub fn generate_secret() -> Result<String, AppError> {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AppError::store_unavailable(format!("Failed to generate secret: {e}")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Hex SHA-256 digest of a secret. Raw secrets are never persisted.
pub fn hash_secret(secret: &str) -> String {
    let digest = Sha256::digest(secret.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

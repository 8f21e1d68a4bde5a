//! Sign-in nonce generation
//!
//! A nonce binds one pending wallet sign-in to the browser that requested it.
//! The value lives only in the `siwe-nonce` cookie; the server keeps no copy.

use rand::RngCore;

/// Nonce entropy in bytes (hex-encoded to 32 characters)
pub const NONCE_BYTES: usize = 16;

/// How long a pending nonce stays valid (cookie max-age, seconds)
pub const NONCE_TTL_SECS: i64 = 300;

/// Generate a fresh hex-encoded nonce from the OS CSPRNG
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

//! Stateless session tokens
//!
//! A token is `base64("{address}:{issued_at_ms}:{hex hmac}")` where the HMAC
//! is HMAC-SHA256 over `"{address}:{issued_at_ms}"` keyed with the process-wide
//! session secret. Nothing is stored server-side: validity is the HMAC plus
//! the 7-day age bound, checked on every request.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum token age in milliseconds (7 days)
pub const SESSION_MAX_AGE_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Session cookie max-age in seconds, kept in step with the token age bound
pub const SESSION_MAX_AGE_SECS: i64 = SESSION_MAX_AGE_MS / 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionTokenError {
    #[error("Token is not valid base64")]
    InvalidEncoding,

    #[error("Token must have exactly three parts")]
    MalformedToken,

    #[error("Token timestamp is not numeric")]
    InvalidTimestamp,

    #[error("Token signature mismatch")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token issued in the future")]
    IssuedInFuture,
}

/// Identity carried by a valid session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Lowercased wallet address
    pub address: String,
    /// Unix milliseconds at mint time
    pub issued_at_ms: i64,
}

/// Mints and validates session tokens
#[derive(Clone)]
pub struct SessionTokenCodec {
    secret: Vec<u8>,
    clock_skew_ms: i64,
}

impl std::fmt::Debug for SessionTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenCodec")
            .field("secret", &"[REDACTED]")
            .field("clock_skew_ms", &self.clock_skew_ms)
            .finish()
    }
}

impl SessionTokenCodec {
    /// Create a codec keyed with `secret`
    ///
    /// `clock_skew_secs` is how far in the future a token timestamp may lie
    /// before it is rejected.
    pub fn new(secret: impl AsRef<[u8]>, clock_skew_secs: i64) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            clock_skew_ms: clock_skew_secs.max(0) * 1000,
        }
    }

    /// Mint a token for `address` stamped with the current time
    pub fn encode(&self, address: &str) -> String {
        self.encode_at(address, Utc::now().timestamp_millis())
    }

    /// Mint a token with an explicit issuance timestamp
    pub fn encode_at(&self, address: &str, issued_at_ms: i64) -> String {
        let payload = format!("{}:{}", address.to_lowercase(), issued_at_ms);
        let signature = self.sign(&payload);
        STANDARD.encode(format!("{}:{}", payload, signature))
    }

    /// Validate a token against the current time
    pub fn decode(&self, token: &str) -> Result<SessionClaims, SessionTokenError> {
        self.decode_at(token, Utc::now().timestamp_millis())
    }

    /// Validate a token against an explicit clock
    pub fn decode_at(&self, token: &str, now_ms: i64) -> Result<SessionClaims, SessionTokenError> {
        let raw = STANDARD
            .decode(token)
            .map_err(|_| SessionTokenError::InvalidEncoding)?;
        let decoded = String::from_utf8(raw).map_err(|_| SessionTokenError::InvalidEncoding)?;

        let parts: Vec<&str> = decoded.split(':').collect();
        let [address, timestamp, signature] = parts.as_slice() else {
            return Err(SessionTokenError::MalformedToken);
        };

        let issued_at_ms: i64 = timestamp
            .parse()
            .map_err(|_| SessionTokenError::InvalidTimestamp)?;

        let expected = self.sign(&format!("{}:{}", address, timestamp));
        let matches: bool = expected.as_bytes().ct_eq(signature.as_bytes()).into();
        if !matches {
            return Err(SessionTokenError::InvalidSignature);
        }

        let age_ms = now_ms.saturating_sub(issued_at_ms);
        if age_ms > SESSION_MAX_AGE_MS {
            return Err(SessionTokenError::Expired);
        }
        if age_ms < -self.clock_skew_ms {
            return Err(SessionTokenError::IssuedInFuture);
        }

        Ok(SessionClaims {
            address: address.to_string(),
            issued_at_ms,
        })
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

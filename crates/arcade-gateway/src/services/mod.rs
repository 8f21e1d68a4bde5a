//! Sign-in protocol services
//!
//! The pieces here are transport-agnostic: handlers own cookies and HTTP
//! status codes, services own the cryptography and message format.

pub mod auth_rate_limiter;
pub mod nonce_service;
pub mod session_token;
pub mod siwe;
pub mod wallet_service;

pub use auth_rate_limiter::{AuthRateLimiter, RateLimitError};
pub use nonce_service::{generate_nonce, NONCE_TTL_SECS};
pub use session_token::{
    SessionClaims, SessionTokenCodec, SessionTokenError, SESSION_MAX_AGE_MS, SESSION_MAX_AGE_SECS,
};
pub use siwe::{SiweError, SiweMessage, SIWE_STATEMENT, SIWE_VERSION};
pub use wallet_service::{WalletError, WalletService};

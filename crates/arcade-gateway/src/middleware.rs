//! Middleware and request extractors for the gateway

pub mod cors;
pub mod ip_extractor;
pub mod session_auth;

pub use cors::cors;
pub use ip_extractor::{extract_ip, TrustedProxies};
pub use session_auth::{AuthenticatedWallet, SessionRequired};

//! Shared library for the GrepCoin arcade backend
//!
//! This crate provides the pieces every service binary needs:
//! - Configuration management (environment variables, secret validation)
//! - Error handling types
//! - Database connection pooling and migrations
//! - Persisted data models
//! - Logging infrastructure

pub mod config;
pub mod db;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{
    Config, DatabaseConfig, Environment, RateLimitConfig, ServerConfig, SessionConfig, SiweConfig,
};
pub use db::DbPool;
pub use error::{Error, Result};

/// Initialize tracing subscriber for structured logging
///
/// Filtering follows `RUST_LOG`; set `LOG_FORMAT=json` for JSON lines output.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shared=debug,arcade_gateway=debug,info".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

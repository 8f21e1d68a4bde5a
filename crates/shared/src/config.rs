//! Configuration management using environment variables
//!
//! # Security
//!
//! This module enforces security requirements for the session secret:
//! - SESSION_SECRET is required in every environment; startup fails without it
//! - Production mode requires at least 32 characters and rejects weak or default secrets
//! - Development mode warns but allows weaker secrets for local testing

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Minimum secret length accepted in production (256 bits of entropy)
const MIN_SECRET_LENGTH: usize = 32;

/// Known weak/default patterns that should never be used in production
const WEAK_SECRET_PATTERNS: &[&str] = &[
    "dev_secret",
    "change_me",
    "changeme",
    "example",
    "secret",
    "password",
    "test",
    "default",
    "grepcoin",
    "your_secret",
    "your-secret",
];

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Session token configuration
    pub session: SessionConfig,

    /// Sign-In-With-Ethereum configuration
    pub siwe: SiweConfig,

    /// Sign-in rate limits
    pub rate_limit: RateLimitConfig,
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" | "local" | "test" => Ok(Environment::Development),
            other => Err(Error::config(format!("Invalid ENVIRONMENT: {}", other))),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Deployment environment (controls secure cookies and secret strictness)
    pub environment: Environment,

    /// Origins allowed to call the API with credentials
    pub cors_allowed_origins: Vec<String>,

    /// Proxies whose forwarding headers are trusted (IPs or CIDR ranges)
    pub trusted_proxies: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// SSL mode for database connection
    /// Options: disable, allow, prefer, require, verify-ca, verify-full
    pub ssl_mode: String,
}

impl DatabaseConfig {
    /// Build a PostgreSQL connection URL with SSL mode
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.user, self.password, self.host, self.port, self.name, self.ssl_mode
        )
    }
}

/// Session token configuration
#[derive(Clone, Deserialize)]
pub struct SessionConfig {
    /// HMAC key for session tokens
    pub secret: String,

    /// How far in the future a token timestamp may lie before it is rejected
    pub clock_skew_secs: i64,

    /// Whether auth cookies carry the `Secure` attribute
    pub cookie_secure: bool,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"[REDACTED]")
            .field("clock_skew_secs", &self.clock_skew_secs)
            .field("cookie_secure", &self.cookie_secure)
            .finish()
    }
}

/// Sign-In-With-Ethereum configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiweConfig {
    /// Domain that must appear in the message header (e.g. `arcade.grepcoin.io`)
    pub domain: String,

    /// URI advertised to clients building the message
    pub uri: String,

    /// Accepted chain ids; empty accepts any chain
    pub chain_ids: Vec<u64>,
}

/// Sign-in rate limits (attempts per minute)
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub per_ip_per_minute: u32,
    pub global_per_minute: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let environment = match env::var("ENVIRONMENT") {
            Ok(value) => value.parse()?,
            Err(_) if cfg!(debug_assertions) => Environment::Development,
            Err(_) => Environment::Production,
        };

        let cors_default = if environment.is_production() {
            ""
        } else {
            "http://localhost:3000"
        };

        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env("SERVER_PORT", 8080)?,
                environment,
                cors_allowed_origins: parse_list(
                    &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| cors_default.to_string()),
                ),
                trusted_proxies: parse_list(&env::var("TRUSTED_PROXIES").unwrap_or_else(|_| {
                    "127.0.0.1,::1,10.0.0.0/8,172.16.0.0/12,192.168.0.0/16,fc00::/7".to_string()
                })),
            },
            database: DatabaseConfig {
                host: env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: parse_env("DB_PORT", 5432)?,
                name: env::var("DB_NAME").unwrap_or_else(|_| "grepcoin".to_string()),
                user: env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string()),
                password: env::var("DB_PASSWORD")
                    .map_err(|_| Error::config("DB_PASSWORD must be set"))?,
                max_connections: parse_env("DB_MAX_CONNECTIONS", 20)?,
                ssl_mode: env::var("DB_SSL_MODE").unwrap_or_else(|_| {
                    if environment.is_production() {
                        "verify-full".to_string()
                    } else {
                        "prefer".to_string()
                    }
                }),
            },
            session: SessionConfig {
                secret: Self::load_session_secret(environment)?,
                clock_skew_secs: parse_env("SESSION_CLOCK_SKEW_SECS", 60)?,
                cookie_secure: environment.is_production(),
            },
            siwe: SiweConfig {
                domain: env::var("SIWE_DOMAIN").unwrap_or_else(|_| "localhost:3000".to_string()),
                uri: env::var("SIWE_URI").unwrap_or_else(|_| "http://localhost:3000".to_string()),
                chain_ids: parse_list(&env::var("SIWE_CHAIN_IDS").unwrap_or_default())
                    .iter()
                    .map(|id| {
                        id.parse::<u64>()
                            .map_err(|e| Error::config(format!("Invalid SIWE_CHAIN_IDS: {}", e)))
                    })
                    .collect::<Result<Vec<_>>>()?,
            },
            rate_limit: RateLimitConfig {
                per_ip_per_minute: parse_nonzero_env("AUTH_RATE_LIMIT_PER_IP", 20)?,
                global_per_minute: parse_nonzero_env("AUTH_RATE_LIMIT_GLOBAL", 1000)?,
            },
        })
    }

    /// Load the session HMAC secret
    ///
    /// No fallback value; a missing secret aborts startup in every environment.
    fn load_session_secret(environment: Environment) -> Result<String> {
        let secret = env::var("SESSION_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                Error::config(
                    "SESSION_SECRET environment variable must be set. \
                     Generate one with: openssl rand -base64 32",
                )
            })?;

        validate_session_secret(&secret, environment.is_production())?;
        Ok(secret)
    }
}

/// Validate the session secret
///
/// With `strict` (production) the secret must be at least 32 characters, must
/// not contain a known weak pattern and must have at least 10 distinct
/// characters. Without `strict` violations are only logged.
///
/// # Errors
///
/// Returns a configuration error describing the first violated rule in strict mode.
pub fn validate_session_secret(secret: &str, strict: bool) -> Result<()> {
    if secret.len() < MIN_SECRET_LENGTH {
        if strict {
            return Err(Error::config(format!(
                "SESSION_SECRET must be at least {} characters. Current length: {} characters. \
                 Generate a secure secret with: openssl rand -base64 32",
                MIN_SECRET_LENGTH,
                secret.len()
            )));
        }
        tracing::warn!(
            length = secret.len(),
            "SESSION_SECRET is shorter than {} characters. DO NOT use in production!",
            MIN_SECRET_LENGTH
        );
    }

    let secret_lower = secret.to_lowercase();
    if let Some(pattern) = WEAK_SECRET_PATTERNS
        .iter()
        .find(|pattern| secret_lower.contains(*pattern))
    {
        if strict {
            return Err(Error::config(format!(
                "SESSION_SECRET contains weak pattern '{}'. \
                 Use a cryptographically secure random value.",
                pattern
            )));
        }
        tracing::error!(
            "SESSION_SECRET contains weak pattern '{}'. \
             This is acceptable in development but MUST be changed for production!",
            pattern
        );
    }

    if strict {
        let unique_chars: std::collections::HashSet<char> = secret.chars().collect();
        if unique_chars.len() < 10 {
            return Err(Error::config(
                "SESSION_SECRET has low entropy (too few unique characters). \
                 Use a cryptographically secure random value.",
            ));
        }
    }

    Ok(())
}

/// Split a comma-separated value, trimming entries and dropping empty ones
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

fn parse_nonzero_env(name: &str, default: u32) -> Result<u32> {
    let value = parse_env(name, default)?;
    if value == 0 {
        return Err(Error::config(format!("{} must be greater than 0", name)));
    }
    Ok(value)
}

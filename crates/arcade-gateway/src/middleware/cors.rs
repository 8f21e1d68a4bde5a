//! CORS Middleware
//!
//! The sign-in flow is cookie based, so cross-origin callers must be listed
//! explicitly and credentials are allowed.
//!
//! - Production accepts HTTPS origins only
//! - Wildcard origins are always dropped
//!
//! Origins come from `CORS_ALLOWED_ORIGINS` via [`shared::ServerConfig`].

use actix_cors::Cors;
use actix_web::http::header;
use shared::ServerConfig;
use tracing::{debug, warn};

/// Create CORS middleware for the configured origins
pub fn cors(config: &ServerConfig) -> Cors {
    let origins = allowed_origins(
        &config.cors_allowed_origins,
        config.environment.is_production(),
    );

    let mut cors = Cors::default();

    if origins.is_empty() {
        warn!("No valid CORS origins configured. Cross-origin requests will be blocked.");
    } else {
        for origin in &origins {
            cors = cors.allowed_origin(origin);
            debug!("CORS: Allowing origin: {}", origin);
        }
    }

    cors.supports_credentials()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![header::CONTENT_TYPE, header::RETRY_AFTER])
        // Max age for preflight requests (1 hour)
        .max_age(3600)
}

/// Filter configured origins down to the ones that are safe to allow
fn allowed_origins(configured: &[String], is_production: bool) -> Vec<String> {
    configured
        .iter()
        .filter(|origin| {
            if origin.as_str() == "*" {
                warn!("Wildcard (*) origin is not allowed with credentialed CORS");
                return false;
            }

            if is_production && !origin.starts_with("https://") {
                warn!(
                    "Rejecting non-HTTPS origin in production: {}. \
                     Only HTTPS origins are allowed in production.",
                    origin
                );
                return false;
            }

            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                warn!(
                    "Invalid origin format: {}. Origins must start with http:// or https://",
                    origin
                );
                return false;
            }

            true
        })
        .cloned()
        .collect()
}

//! Common Handler Helpers
//!
//! Shared response shapes so every handler reports validation, rate-limit and
//! storage failures the same way.

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse};
use validator::Validate;

use crate::middleware::{extract_ip, TrustedProxies};
use crate::models::ErrorResponse;
use crate::services::AuthRateLimiter;

// ============================================================================
// Validation Helpers
// ============================================================================

/// Validate a request struct or return 400 Bad Request
///
/// # Example
///
/// ```ignore
/// if let Err(resp) = validate_request(&body) {
///     return resp;
/// }
/// ```
pub fn validate_request<T: Validate>(req: &T) -> Result<(), HttpResponse> {
    req.validate().map_err(|e| {
        let details = serde_json::to_value(&e).unwrap_or_default();
        HttpResponse::BadRequest().json(ErrorResponse::with_details(
            "validation_error",
            format!("Validation failed: {}", e),
            details,
        ))
    })
}

// ============================================================================
// Rate Limiting Helpers
// ============================================================================

/// Apply the sign-in rate limiter to the calling client
///
/// # Returns
///
/// * `Err(HttpResponse)` - 429 with a `Retry-After` header
pub fn check_rate_limit(
    req: &HttpRequest,
    limiter: &AuthRateLimiter,
    proxies: &TrustedProxies,
) -> Result<(), HttpResponse> {
    let ip = extract_ip(req, proxies);
    limiter.check(&ip).map_err(|e| {
        HttpResponse::TooManyRequests()
            .insert_header((header::RETRY_AFTER, e.retry_after_secs.to_string()))
            .json(ErrorResponse::new("rate_limited", e.message))
    })
}

// ============================================================================
// Error Handling Helpers
// ============================================================================

/// The single response for every failed sign-in check
pub fn verification_failed() -> HttpResponse {
    HttpResponse::Unauthorized().json(ErrorResponse::new(
        "verification_failed",
        "Verification failed",
    ))
}

/// Handle storage errors with consistent logging and response
///
/// # Arguments
///
/// * `result` - A Result from a repository call
/// * `context` - Operation description for the log line
///
/// # Example
///
/// ```ignore
/// let user = match handle_db_error(store.find_by_wallet(&address).await, "find user") {
///     Ok(user) => user,
///     Err(resp) => return resp,
/// };
/// ```
pub fn handle_db_error<T>(result: anyhow::Result<T>, context: &str) -> Result<T, HttpResponse> {
    result.map_err(|e| {
        tracing::error!(error = ?e, "Failed to {}", context);
        HttpResponse::InternalServerError().json(ErrorResponse::new(
            "internal_error",
            "An internal error occurred",
        ))
    })
}

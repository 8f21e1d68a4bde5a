//! OpenAPI Documentation Configuration
//!
//! Generated with utoipa from handler annotations and DTO schemas.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;
use crate::handlers::health::HealthResponse;
use crate::models;

/// OpenAPI documentation for the GrepCoin Arcade gateway
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GrepCoin Arcade API",
        version = "1.0.0",
        description = "Wallet sign-in for the GrepCoin Arcade.\n\n## Sign-in flow\n\n1. `GET /api/v1/auth/nonce` sets the `siwe-nonce` cookie\n2. The wallet signs the SIWE message (build it with `POST /api/v1/auth/message`)\n3. `POST /api/v1/auth/verify` sets the `session` cookie\n\nSessions last 7 days and are checked on every request.",
        contact(
            name = "GrepCoin Team",
            url = "https://grepcoin.io"
        ),
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development server")
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Auth", description = "Sign-In-With-Ethereum and session cookies"),
        (name = "Discovery", description = "API discovery and metadata")
    ),
    modifiers(&SecurityAddon),
    paths(
        // Health
        handlers::health_check,
        // Discovery
        handlers::openapi_json,
        // Auth
        handlers::get_nonce,
        handlers::build_message,
        handlers::verify,
        handlers::logout,
        handlers::get_session,
    ),
    components(
        schemas(
            // Common
            models::ErrorResponse,
            // Auth
            models::NonceResponse,
            models::MessageRequest,
            models::MessageResponse,
            models::VerifyRequest,
            models::VerifyResponse,
            models::SessionUser,
            models::SessionResponse,
            models::LogoutResponse,
            // Health
            HealthResponse,
        )
    )
)]
pub struct ApiDoc;

/// Documents the session cookie as the authentication scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "HMAC-signed session token set by /api/v1/auth/verify. Valid for 7 days.",
            ))),
        );
    }
}

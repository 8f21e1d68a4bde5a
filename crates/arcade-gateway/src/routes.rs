//! Route configuration for the API

use actix_web::{error::InternalError, web, HttpResponse};

use crate::handlers;
use crate::models::ErrorResponse;

/// Maximum accepted JSON body size
pub const JSON_BODY_LIMIT: usize = 16 * 1024;

/// Configure all routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config());

    cfg.service(
        web::scope("/api/v1")
            // Health check endpoint (no auth required)
            .route("/health", web::get().to(handlers::health_check))
            .route("/openapi.json", web::get().to(handlers::openapi_json))
            // Wallet sign-in
            .service(
                web::scope("/auth")
                    .route("/nonce", web::get().to(handlers::get_nonce))
                    .route("/message", web::post().to(handlers::build_message))
                    .route("/verify", web::post().to(handlers::verify))
                    .route("/logout", web::post().to(handlers::logout))
                    .route("/session", web::get().to(handlers::get_session)),
            ),
    );
}

/// JSON extractor settings: size limit and a JSON 400 body for bad payloads
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_BODY_LIMIT)
        .error_handler(|err, _req| {
            tracing::debug!(error = %err, "Rejected JSON payload");
            let response = HttpResponse::BadRequest().json(ErrorResponse::new(
                "validation_error",
                format!("Invalid request body: {}", err),
            ));
            InternalError::from_response(err, response).into()
        })
}

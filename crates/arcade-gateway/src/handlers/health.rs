//! Health check and service endpoints

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::openapi::ApiDoc;
use crate::repositories::UserStore;

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
}

/// Health check endpoint
///
/// Returns the health status of the gateway and its database.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    )
)]
pub async fn health_check(store: web::Data<dyn UserStore>) -> impl Responder {
    let connected = match store.check_health().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = ?e, "Health check failed");
            false
        }
    };

    let response = HealthResponse {
        status: if connected { "healthy" } else { "unhealthy" }.to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    if connected {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

/// OpenAPI JSON endpoint
#[utoipa::path(
    get,
    path = "/api/v1/openapi.json",
    tag = "Discovery",
    responses(
        (status = 200, description = "OpenAPI specification", content_type = "application/json")
    )
)]
pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().content_type("application/json").body(
        ApiDoc::openapi()
            .to_json()
            .unwrap_or_else(|_| "{}".to_string()),
    )
}

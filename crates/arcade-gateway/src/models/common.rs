//! Common DTOs shared across multiple resources

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"error": "verification_failed", "message": "Verification failed"}))]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

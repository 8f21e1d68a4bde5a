//! OpenAPI Schema Export Binary
//!
//! Writes the gateway's OpenAPI specification as JSON to stdout.
//!
//! Usage:
//!   cargo run -p arcade-gateway --bin export-openapi > openapi.json

use arcade_gateway::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() {
    let openapi_json = ApiDoc::openapi()
        .to_pretty_json()
        .expect("Failed to serialize OpenAPI spec to JSON");

    println!("{}", openapi_json);
}

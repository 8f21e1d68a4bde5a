//! GrepCoin Arcade gateway
//!
//! Serves wallet sign-in (SIWE) and session endpoints.

use actix_web::{App, HttpServer};
use anyhow::Context;
use arcade_gateway::repositories::{UserRepository, UserStore};
use arcade_gateway::{middleware, AppState};
use shared::{db, Config};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    shared::init_tracing();

    tracing::info!("Starting GrepCoin Arcade gateway...");

    // Load configuration (fails without SESSION_SECRET)
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!(
        environment = ?config.server.environment,
        siwe_domain = %config.siwe.domain,
        chain_ids = ?config.siwe.chain_ids,
        "Configuration loaded"
    );

    // Create database connection pool
    let db_pool = db::create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;

    // Run database migrations
    db::run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;

    // Check database health
    db::check_health(&db_pool)
        .await
        .context("Database health check failed")?;

    let store: Arc<dyn UserStore> = Arc::new(UserRepository::new(db_pool));
    let state = AppState::from_config(&config, store);

    let server_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Gateway listening on {}", server_addr);

    let server_config = config.server.clone();

    // Start HTTP server
    HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(middleware::cors(&server_config))
            .wrap(TracingLogger::default())
            .configure(move |cfg| state.configure(cfg))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind to {}", server_addr))?
    .run()
    .await
    .context("Server error")?;

    Ok(())
}

/// Mission registry service entry point
mod config;
mod domain;
mod errors;
mod handlers;
mod repo;
mod routes;
mod services;
mod validate;

use crate::config::AppConfig;
use crate::handlers::AppState;
use crate::repo::{init_db, AstronautRepo, MissionRepo, SpaceshipRepo};
use crate::routes::build_router;
use crate::services::{AstronautService, MissionService, SpaceshipService};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Configuration loaded successfully");

    // Initialize database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    info!("Database connection pool established");

    // Initialize database schema
    init_db(&pool).await?;
    info!("Database schema initialized");

    // Initialize repositories
    let astronaut_repo = AstronautRepo::new(pool.clone());
    let spaceship_repo = SpaceshipRepo::new(pool.clone());
    let mission_repo = MissionRepo::new(pool.clone());

    // Initialize services
    let astronaut_service = Arc::new(AstronautService::new(astronaut_repo));
    let spaceship_service = Arc::new(SpaceshipService::new(spaceship_repo));
    let mission_service = Arc::new(MissionService::new(pool.clone(), mission_repo));

    // Initialize application state
    let state = AppState {
        astronaut_service,
        spaceship_service,
        mission_service,
        default_list_limit: config.list_limit,
    };

    // Build router
    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("mission_registry service listening on {}", config.bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

use anyhow::Result;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plateful::api;
use plateful::config::Config;
use plateful::db::init_database;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,plateful=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    Config::init()?;
    info!("Initialized configuration");

    // Initialize database
    let db = Arc::new(init_database().await?);
    info!("Connected to database");

    // Run the API server until it exits or a shutdown signal arrives
    tokio::select! {
        result = api::start_api_server(db) => result?,
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down");
        }
    }

    info!("Plateful shutdown complete");
    Ok(())
}

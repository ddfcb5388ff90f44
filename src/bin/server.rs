//! Food log HTTP server
//!
//! Serves the meal and entry ordering operations over JSON.
//!
//! # Configuration
//!
//! Uses the same config file and environment variables as the `foodlog` CLI.
//! `FOODLOG_CONFIG` points at an alternate config file; `FOODLOG_PORT`
//! overrides the listen port (default: 8080).

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use foodlog::config::Config;
use foodlog::db::Store;
use foodlog::server::{router, AppState};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foodlog=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var("FOODLOG_CONFIG").ok().map(PathBuf::from);
    let config = Config::load(config_path)?;

    tracing::info!("Database: {}", config.database_path.value.display());
    tracing::info!(
        retry_attempts = config.retry_attempts.value,
        position_policy = %config.position_policy.value,
        "ordering policies"
    );

    let store = Store::open(&config).await?;
    let app = router(AppState::new(store));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port.value));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

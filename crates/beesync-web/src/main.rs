//! BeeSync web server
//!
//! Run with: cargo run -p beesync-web

use std::sync::Arc;

use beesync_config::Config;
use beesync_web::poller::spawn_pollers;
use beesync_web::state::AppState;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; RUST_LOG overrides the default level
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting BeeSync web server...");

    let config = Config::load()?;
    let bind = config.server.bind.clone();
    info!(
        monitoring = %config.backend.monitoring_url,
        services = %config.backend.services_url,
        "Backends configured"
    );

    let state = Arc::new(AppState::new(config)?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pollers = spawn_pollers(state.clone(), shutdown_rx);

    let app = beesync_web::router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("🐝 Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    for handle in pollers {
        let _ = handle.await;
    }
    info!("BeeSync stopped");

    Ok(())
}

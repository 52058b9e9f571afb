use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::{AppConfig, initialize_app_state};
use crate::router::create_router;

/// Serves the API against an already migrated database.
pub async fn serve(config: &AppConfig) -> Result<()> {
    debug!(database_url = %config.database_url, "Building application state");
    let state = initialize_app_state(config)
        .await
        .context("cannot initialize application state")?;

    run_server(create_router(state), &config.bind_address).await
}

pub(crate) async fn run_server(app: Router, bind_address: &str) -> Result<()> {
    let listener = TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("cannot bind {}", bind_address))?;

    info!("moneybook listening on http://{}", bind_address);
    info!("API docs at http://{}/swagger-ui", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated with an error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for shutdown signal: {}", e);
        // Without a signal handler keep serving until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

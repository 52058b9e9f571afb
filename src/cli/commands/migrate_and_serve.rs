use anyhow::{Context, Result};
use tracing::info;

use super::initdb::run_migrations;
use super::serve::run_server;
use crate::config::{AppConfig, initialize_app_state};
use crate::router::create_router;

pub async fn migrate_and_serve(config: &AppConfig) -> Result<()> {
    info!("Migrating before serving");
    let state = initialize_app_state(config)
        .await
        .context("cannot initialize application state")?;

    // Reuse the state's connection so in-memory SQLite sees the migrated schema.
    run_migrations(&state.db).await?;

    run_server(create_router(state), &config.bind_address).await
}

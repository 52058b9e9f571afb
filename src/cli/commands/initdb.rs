use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use tracing::{debug, info, instrument};

/// Connects to `database_url` and brings the schema up to date.
#[instrument]
pub async fn init_database(database_url: &str) -> Result<()> {
    info!("Preparing moneybook database");

    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("cannot connect to database '{}'", database_url))?;
    debug!("Connection established");

    run_migrations(&db).await?;
    info!("Database is ready");
    Ok(())
}

/// Applies pending migrations on an existing connection.
pub(crate) async fn run_migrations(db: &DatabaseConnection) -> Result<()> {
    let pending = Migrator::get_pending_migrations(db)
        .await
        .context("cannot read migration state")?;
    if pending.is_empty() {
        info!("Schema already up to date");
        return Ok(());
    }

    info!("Applying {} pending migration(s)", pending.len());
    Migrator::up(db, None).await.context("migration failed")?;
    info!("Migrations applied");
    Ok(())
}

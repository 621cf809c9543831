use super::ConfigArgs;
use anyhow::{Context, Result};
use clap::Args;
use trade_engine_data::SqlitePositionStore;

#[derive(Args, Debug, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Creates the database if needed and applies pending migrations.
///
/// # Errors
/// Returns an error if the config or database cannot be opened.
pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let config = args.config.load()?;
    let store = SqlitePositionStore::connect(&config.database.url, 1)
        .await
        .with_context(|| format!("Failed to migrate {}", config.database.url))?;
    store.close().await;

    tracing::info!(url = %config.database.url, "Migrations applied");
    Ok(())
}

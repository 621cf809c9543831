use super::ConfigArgs;
use anyhow::{Context, Result};
use clap::Args;
use trade_engine_core::{Position, PositionStore};
use trade_engine_data::SqlitePositionStore;

#[derive(Args, Debug, Clone)]
pub struct PositionsArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Only show open positions
    #[arg(long)]
    pub open: bool,
}

/// Prints stored positions as a table.
///
/// # Errors
/// Returns an error if the database cannot be opened or read.
pub async fn run_positions(args: PositionsArgs) -> Result<()> {
    let config = args.config.load()?;
    let store = SqlitePositionStore::connect(&config.database.url, 1).await?;

    let positions = if args.open {
        store.list_open_positions().await
    } else {
        store.list_positions().await
    }
    .context("Failed to read positions")?;
    store.close().await;

    if positions.is_empty() {
        println!("No positions.");
        return Ok(());
    }

    println!("{}", header());
    for position in &positions {
        println!("{}", row(position));
    }
    println!("\n{} position(s)", positions.len());
    Ok(())
}

fn header() -> String {
    format!(
        "{:>6}  {:<10} {:<4}  {:<13} {:>14} {:>14} {:>14}  {}",
        "ID", "SYMBOL", "SIDE", "STATUS", "ENTRY", "STOP_LOSS", "TARGET", "CREATED"
    )
}

fn row(p: &Position) -> String {
    format!(
        "{:>6}  {:<10} {:<4}  {:<13} {:>14.4} {:>14.4} {:>14.4}  {}",
        p.id,
        p.symbol,
        p.side.as_str(),
        p.status.as_str(),
        p.entry_price,
        p.stop_loss,
        p.target,
        p.created_at.format("%Y-%m-%d %H:%M:%S")
    )
}

use clap::{Parser, Subcommand};

mod commands;

use commands::{MigrateArgs, PositionsArgs, RunArgs};

#[derive(Parser)]
#[command(name = "trade-engine")]
#[command(about = "Signal intake and stop-loss/target monitoring for open positions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitor, price feed, signal intake, and web API
    Run(RunArgs),
    /// List stored positions
    Positions(PositionsArgs),
    /// Create the database and apply migrations
    Migrate(MigrateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Run(args) => commands::run_engine(args).await?,
        Commands::Positions(args) => commands::run_positions(args).await?,
        Commands::Migrate(args) => commands::run_migrate(args).await?,
    }

    Ok(())
}

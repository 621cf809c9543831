//! CLI commands for the trade engine.

pub mod migrate;
pub mod positions;
pub mod run;

pub use migrate::{run_migrate, MigrateArgs};
pub use positions::{run_positions, PositionsArgs};
pub use run::{run_engine, RunArgs};

use anyhow::{Context, Result};
use clap::Args;
use trade_engine_core::{AppConfig, ConfigLoader};

/// Where to load configuration from.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,

    /// Profile layered over the base file (reads `Config.<profile>.toml`)
    #[arg(long, env = "APP_PROFILE")]
    pub profile: Option<String>,
}

impl ConfigArgs {
    /// # Errors
    /// Returns an error if a config source is present but invalid.
    pub fn load(&self) -> Result<AppConfig> {
        match &self.profile {
            Some(profile) => ConfigLoader::load_with_profile(&self.config, profile),
            None => ConfigLoader::load(&self.config),
        }
        .with_context(|| format!("Failed to load config from {}", self.config))
    }
}

pub mod config;
pub mod config_loader;
pub mod error;
pub mod events;
pub mod exit;
pub mod position;
pub mod traits;

pub use config::{
    AppConfig, DatabaseConfig, IntakeConfig, MonitorConfig, PriceFeedConfig, ServerConfig,
};
pub use config_loader::ConfigLoader;
pub use error::StorageError;
pub use events::StatusChange;
pub use exit::{evaluate_exit, ExitDecision, Quote};
pub use position::{NewPosition, Position, PositionStatus, Side, Signal, ThresholdError};
pub use traits::{PositionStore, QuoteSource};

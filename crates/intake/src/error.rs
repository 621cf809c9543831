use thiserror::Error;
use trade_engine_core::{StorageError, ThresholdError};

/// Reasons a signal does not become a position.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("Malformed signal: {0}")]
    Malformed(String),

    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(#[from] ThresholdError),

    #[error("{symbol} already has open position #{position_id}")]
    DuplicateOpen { symbol: String, position_id: i64 },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<serde_json::Error> for IntakeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

use crate::position::{PositionStatus, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A committed status transition, published for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub position_id: i64,
    pub symbol: String,
    pub side: Side,
    pub from: PositionStatus,
    pub to: PositionStatus,
    /// Price that triggered the transition.
    pub price: f64,
    pub at: DateTime<Utc>,
}

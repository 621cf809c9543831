//! Signal and position records.
//!
//! A `Signal` is the raw instruction that originated a trade; a `Position` is
//! the tracked trade itself. Both are owned by the store; everything else
//! works on short-lived copies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Direction of a position. Decides which way the exit comparisons point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }

    /// Parses the persisted representation (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Some(Self::Buy),
            "SELL" => Some(Self::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a position.
///
/// `Open` is the only non-terminal state. Nothing leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStatus {
    Open,
    Closed,
    StopLossHit,
    TargetHit,
}

impl PositionStatus {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::StopLossHit => "STOP_LOSS_HIT",
            Self::TargetHit => "TARGET_HIT",
        }
    }

    /// Parses the persisted representation (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Some(Self::Open),
            "CLOSED" => Some(Self::Closed),
            "STOP_LOSS_HIT" => Some(Self::StopLossHit),
            "TARGET_HIT" => Some(Self::TargetHit),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append-only record of an inbound trading instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: i64,
    pub symbol: String,
    /// Opaque payload exactly as received.
    pub raw_payload: String,
    pub received_at: DateTime<Utc>,
}

/// A tracked trade as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: i64,
    pub signal_id: i64,
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub target: f64,
    pub status: PositionStatus,
    pub created_at: DateTime<Utc>,
}

impl Position {
    /// Checks the side-aware ordering of stop-loss, entry, and target.
    ///
    /// # Errors
    /// Returns a `ThresholdError` describing the first violated rule.
    pub fn validate_thresholds(&self) -> Result<(), ThresholdError> {
        validate_thresholds(self.side, self.entry_price, self.stop_loss, self.target)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {}({}) status={} entry={} stop_loss={} target={}",
            self.id,
            self.symbol,
            self.side,
            self.status,
            self.entry_price,
            self.stop_loss,
            self.target
        )
    }
}

/// Insert form of a position. The store assigns `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPosition {
    pub signal_id: i64,
    pub symbol: String,
    pub side: Side,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub target: f64,
    pub status: PositionStatus,
    pub created_at: DateTime<Utc>,
}

impl NewPosition {
    /// Builds an `Open` position stamped with the current time.
    #[must_use]
    pub fn open(
        signal_id: i64,
        symbol: impl Into<String>,
        side: Side,
        entry_price: f64,
        stop_loss: f64,
        target: f64,
    ) -> Self {
        Self {
            signal_id,
            symbol: symbol.into(),
            side,
            entry_price,
            stop_loss,
            target,
            status: PositionStatus::Open,
            created_at: Utc::now(),
        }
    }

    /// Overrides the initial status. Only meant for backfills and tests;
    /// live intake always creates `Open` positions.
    #[must_use]
    pub fn with_status(mut self, status: PositionStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// # Errors
    /// Returns a `ThresholdError` describing the first violated rule.
    pub fn validate_thresholds(&self) -> Result<(), ThresholdError> {
        validate_thresholds(self.side, self.entry_price, self.stop_loss, self.target)
    }
}

/// Violations of the price ordering a position must respect.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("BUY requires stop_loss < entry_price < target (got {stop_loss} / {entry_price} / {target})")]
    BuyOrdering {
        entry_price: f64,
        stop_loss: f64,
        target: f64,
    },

    #[error("SELL requires target < entry_price < stop_loss (got {target} / {entry_price} / {stop_loss})")]
    SellOrdering {
        entry_price: f64,
        stop_loss: f64,
        target: f64,
    },
}

fn validate_thresholds(
    side: Side,
    entry_price: f64,
    stop_loss: f64,
    target: f64,
) -> Result<(), ThresholdError> {
    for (field, value) in [
        ("entry_price", entry_price),
        ("stop_loss", stop_loss),
        ("target", target),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(ThresholdError::NotPositive { field, value });
        }
    }

    let ordered = match side {
        Side::Buy => stop_loss < entry_price && entry_price < target,
        Side::Sell => target < entry_price && entry_price < stop_loss,
    };
    if ordered {
        return Ok(());
    }

    Err(match side {
        Side::Buy => ThresholdError::BuyOrdering {
            entry_price,
            stop_loss,
            target,
        },
        Side::Sell => ThresholdError::SellOrdering {
            entry_price,
            stop_loss,
            target,
        },
    })
}

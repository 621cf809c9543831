//! Wire format of a forwarded trade signal.

use serde::{Deserialize, Deserializer, Serialize};
use trade_engine_core::{NewPosition, Side};

use crate::error::IntakeError;

/// Message published for every stored signal.
///
/// ```json
/// { "signal_id": 12, "signal_symbol": "BTCUSD",
///   "signal": { "symbol": "BTCUSD", "side": "BUY", "entry_price": 50000,
///               "stop_loss": 49000, "target": 55000 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignalMessage {
    pub signal_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_symbol: Option<String>,
    pub signal: SignalBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalBody {
    pub symbol: String,
    #[serde(deserialize_with = "side_any_case")]
    pub side: Side,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub target: f64,
}

impl TradeSignalMessage {
    /// # Errors
    /// `IntakeError::Malformed` if the text is not a complete message.
    pub fn decode(text: &str) -> Result<Self, IntakeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// # Errors
    /// `IntakeError::Malformed` if the value is not a complete message.
    pub fn from_value(value: serde_json::Value) -> Result<Self, IntakeError> {
        Ok(serde_json::from_value(value)?)
    }

    /// The `Open` position this signal asks for.
    #[must_use]
    pub fn to_new_position(&self) -> NewPosition {
        NewPosition::open(
            self.signal_id,
            self.signal.symbol.clone(),
            self.signal.side,
            self.signal.entry_price,
            self.signal.stop_loss,
            self.signal.target,
        )
    }
}

fn side_any_case<'de, D>(deserializer: D) -> Result<Side, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Side::parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unknown side '{raw}'")))
}

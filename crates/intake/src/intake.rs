use crate::error::IntakeError;
use crate::payload::TradeSignalMessage;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use trade_engine_core::PositionStore;

/// Creates positions from forwarded signals.
///
/// A signal becomes at most one `Open` position. Signals whose symbol
/// already has an open position are refused.
#[derive(Clone)]
pub struct SignalIntake {
    store: Arc<dyn PositionStore>,
}

impl SignalIntake {
    #[must_use]
    pub fn new(store: Arc<dyn PositionStore>) -> Self {
        Self { store }
    }

    /// Handles one forwarded message and returns the new position id.
    ///
    /// # Errors
    /// Any `IntakeError`; no position is created in that case.
    pub async fn handle_message(&self, message: Value) -> Result<i64, IntakeError> {
        let message = TradeSignalMessage::from_value(message)?;
        self.handle(&message).await
    }

    /// # Errors
    /// Any `IntakeError`; no position is created in that case.
    pub async fn handle(&self, message: &TradeSignalMessage) -> Result<i64, IntakeError> {
        let position = message.to_new_position();
        position.validate_thresholds()?;

        let existing = self
            .store
            .find_open_positions_by_symbol(&position.symbol)
            .await?;
        if let Some(open) = existing.first() {
            return Err(IntakeError::DuplicateOpen {
                symbol: position.symbol,
                position_id: open.id,
            });
        }

        let id = self.store.create_position(&position).await?;
        info!(
            position_id = id,
            signal_id = position.signal_id,
            symbol = %position.symbol,
            side = %position.side,
            entry_price = position.entry_price,
            stop_loss = position.stop_loss,
            target = position.target,
            "New position opened"
        );
        Ok(id)
    }

    /// Consumes messages until every sender is dropped.
    ///
    /// Refused signals are logged and dropped; the loop keeps going.
    pub async fn run(self, mut rx: mpsc::Receiver<Value>) {
        info!("Signal intake started");
        while let Some(message) = rx.recv().await {
            match self.handle_message(message).await {
                Ok(_) => {}
                Err(e @ IntakeError::Storage(_)) => {
                    error!(error = %e, "Signal dropped");
                }
                Err(e) => warn!(error = %e, "Signal refused"),
            }
        }
        info!("Signal intake stopped");
    }
}

use crate::server::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tokio::sync::broadcast::{self, error::RecvError};
use trade_engine_core::StatusChange;

/// Streams monitor status transitions as JSON text frames.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let events = state.events.subscribe();
    ws.on_upgrade(|socket| websocket_connection(socket, events))
}

async fn websocket_connection(mut socket: WebSocket, mut events: broadcast::Receiver<StatusChange>) {
    loop {
        tokio::select! {
            event = events.recv() => {
                let change = match event {
                    Ok(change) => change,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "WebSocket client lagging, events dropped");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(text) = frame(&change) else { continue };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed");
}

fn frame(change: &StatusChange) -> Option<String> {
    serde_json::to_string(change).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use trade_engine_core::{PositionStatus, Side};

    #[test]
    fn frames_carry_the_transition() {
        let change = StatusChange {
            position_id: 4,
            symbol: "BTCUSD".into(),
            side: Side::Buy,
            from: PositionStatus::Open,
            to: PositionStatus::StopLossHit,
            price: 48_950.5,
            at: Utc::now(),
        };
        let value: serde_json::Value = serde_json::from_str(&frame(&change).unwrap()).unwrap();
        assert_eq!(value["position_id"], 4);
        assert_eq!(value["to"], "STOP_LOSS_HIT");
        assert_eq!(value["side"], "BUY");
    }
}

use crate::server::AppState;
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::mpsc::error::TrySendError;
use trade_engine_core::Position;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    const fn new(message: &'static str) -> Json<Self> {
        Json(Self { message })
    }
}

/// Row of `GET /api/trades`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TradeView {
    #[serde(rename = "ID")]
    pub id: i64,
    pub symbol: String,
    pub side: String,
    pub status: String,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub target: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<Position> for TradeView {
    fn from(p: Position) -> Self {
        Self {
            id: p.id,
            symbol: p.symbol,
            side: p.side.to_string(),
            status: p.status.to_string(),
            entry_price: p.entry_price,
            stop_loss: p.stop_loss,
            target: p.target,
            timestamp: p.created_at,
        }
    }
}

pub async fn health() -> &'static str {
    "Server is running"
}

/// Stores an inbound signal and forwards it to intake.
///
/// The body must be a JSON object with a string `symbol`. The stored raw
/// payload is the body text exactly as received.
pub async fn receive_signal(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<MessageResponse>) {
    let bad_request = (
        StatusCode::BAD_REQUEST,
        MessageResponse::new("Payload must not be empty"),
    );

    let Ok(raw) = std::str::from_utf8(&body) else {
        return bad_request;
    };
    let Ok(data) = serde_json::from_str::<Value>(raw) else {
        return bad_request;
    };
    let Some(symbol) = data.get("symbol").and_then(Value::as_str) else {
        return bad_request;
    };
    let symbol = symbol.to_string();

    let signal_id = match state.store.create_signal(&symbol, raw, Utc::now()).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, symbol = %symbol, "Failed to store signal");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                MessageResponse::new("Failed to store signal"),
            );
        }
    };
    tracing::info!(signal_id, symbol = %symbol, "Signal received");

    let message = json!({
        "signal_id": signal_id,
        "signal_symbol": symbol,
        "signal": data,
    });
    // The signal is already stored; a backed-up intake must not hold the response.
    match state.signals.try_send(message) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            tracing::warn!(signal_id, "Intake queue is full, signal not forwarded");
        }
        Err(TrySendError::Closed(_)) => {
            tracing::warn!(signal_id, "Intake is not running, signal not forwarded");
        }
    }

    (StatusCode::OK, MessageResponse::new("Signal received"))
}

/// Lists every position, newest first.
///
/// # Errors
/// Returns `StatusCode::INTERNAL_SERVER_ERROR` if the store cannot be read.
pub async fn list_trades(
    State(state): State<AppState>,
) -> Result<Json<Vec<TradeView>>, StatusCode> {
    let positions = state.store.list_positions().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to list trades");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(positions.into_iter().map(TradeView::from).collect()))
}

/// Swagger 2.0 description of the JSON routes.
pub async fn api_doc() -> Json<Value> {
    Json(json!({
        "swagger": "2.0",
        "info": {
            "title": "Trade Execution API",
            "version": "1.0.0",
            "description": "API for handling trading Signal and Trade"
        },
        "paths": {
            "/api/signal": {
                "post": {
                    "tags": ["signal"],
                    "summary": "Receive a trading signal",
                    "parameters": [{
                        "in": "body",
                        "name": "body",
                        "description": "JSON object containing the signal data",
                        "required": true,
                        "schema": {
                            "type": "object",
                            "required": ["symbol"],
                            "properties": {
                                "symbol": { "type": "string" },
                                "side": { "type": "string" },
                                "entry_price": { "type": "number" },
                                "stop_loss": { "type": "number" },
                                "target": { "type": "number" }
                            }
                        }
                    }],
                    "responses": {
                        "200": {
                            "description": "Signal received",
                            "schema": {
                                "type": "object",
                                "properties": { "message": { "type": "string" } }
                            }
                        },
                        "400": { "description": "Invalid input" },
                        "500": { "description": "Signal could not be stored" }
                    }
                }
            },
            "/api/trades": {
                "get": {
                    "tags": ["trades"],
                    "summary": "Get all trades",
                    "parameters": [],
                    "responses": {
                        "200": {
                            "description": "List of trades",
                            "schema": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "ID": { "type": "integer" },
                                        "Symbol": { "type": "string" },
                                        "Side": { "type": "string" },
                                        "Status": { "type": "string" },
                                        "EntryPrice": { "type": "number" },
                                        "StopLoss": { "type": "number" },
                                        "Target": { "type": "number" },
                                        "Timestamp": { "type": "string", "format": "date-time" }
                                    }
                                }
                            }
                        },
                        "500": { "description": "Trades could not be read" }
                    }
                }
            }
        }
    }))
}

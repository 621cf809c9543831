use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceExt;
use trade_engine_core::{NewPosition, PositionStatus, PositionStore, Side};
use trade_engine_data::SqlitePositionStore;
use trade_engine_web_api::{ApiServer, AppState};

struct Harness {
    store: Arc<SqlitePositionStore>,
    forwarded: mpsc::Receiver<Value>,
    router: Router,
}

async fn harness() -> Harness {
    harness_with_queue(16).await
}

async fn harness_with_queue(capacity: usize) -> Harness {
    let store = Arc::new(SqlitePositionStore::in_memory().await.unwrap());
    let (signals, forwarded) = mpsc::channel(capacity);
    let (events, _) = broadcast::channel(16);
    let state = AppState {
        store: store.clone(),
        signals,
        events,
    };
    Harness {
        store,
        forwarded,
        router: ApiServer::new(state).router(),
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn post_signal(body: &str) -> Request<Body> {
    Request::post("/api/signal")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn root_reports_running() {
    let h = harness().await;
    let (status, body) = send(&h.router, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Server is running");
}

#[tokio::test]
async fn signal_is_stored_and_forwarded() {
    let mut h = harness().await;
    let payload = r#"{"symbol":"BTCUSD","side":"BUY","entry_price":50000,"stop_loss":49000,"target":55000}"#;

    let (status, body) = send(&h.router, post_signal(payload)).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({ "message": "Signal received" }));

    let forwarded = h.forwarded.try_recv().unwrap();
    let signal_id = forwarded["signal_id"].as_i64().unwrap();
    assert_eq!(forwarded["signal_symbol"], "BTCUSD");
    assert_eq!(forwarded["signal"]["stop_loss"], 49000);

    let stored = h.store.get_signal(signal_id).await.unwrap().unwrap();
    assert_eq!(stored.symbol, "BTCUSD");
    assert_eq!(stored.raw_payload, payload);
}

#[tokio::test]
async fn full_intake_queue_does_not_hold_the_response() {
    let mut h = harness_with_queue(1).await;

    for symbol in ["BTCUSD", "ETHUSD"] {
        let body = format!(r#"{{"symbol":"{symbol}"}}"#);
        let response = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            send(&h.router, post_signal(&body)),
        )
        .await
        .expect("signal response was held by a full queue");
        assert_eq!(response.0, StatusCode::OK);
    }

    let forwarded = h.forwarded.try_recv().unwrap();
    assert_eq!(forwarded["signal_symbol"], "BTCUSD");
    assert!(h.forwarded.try_recv().is_err());

    // Both signals are stored even though only one was forwarded.
    let second = h.store.get_signal(forwarded["signal_id"].as_i64().unwrap() + 1).await;
    assert_eq!(second.unwrap().unwrap().symbol, "ETHUSD");
}

#[tokio::test]
async fn doc_describes_the_json_routes() {
    let h = harness().await;
    let (status, body) = send(&h.router, Request::get("/api/doc").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let doc: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(doc["swagger"], "2.0");
    assert_eq!(doc["info"]["title"], "Trade Execution API");
    assert_eq!(doc["paths"]["/api/signal"]["post"]["parameters"][0]["schema"]["required"], json!(["symbol"]));
    assert!(doc["paths"]["/api/trades"]["get"]["responses"]["200"].is_object());
}

#[tokio::test]
async fn signal_without_symbol_is_rejected() {
    let mut h = harness().await;

    for body in ["", "not json", "{}", r#"{"side":"BUY"}"#, r#"{"symbol":42}"#] {
        let (status, response) = send(&h.router, post_signal(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body:?}");
        let response: Value = serde_json::from_slice(&response).unwrap();
        assert_eq!(response["message"], "Payload must not be empty");
    }

    assert!(h.forwarded.try_recv().is_err());
    assert!(h.store.list_positions().await.unwrap().is_empty());
}

#[tokio::test]
async fn store_failure_is_a_server_error() {
    let mut h = harness().await;
    h.store.close().await;

    let (status, _) = send(&h.router, post_signal(r#"{"symbol":"BTCUSD"}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(h.forwarded.try_recv().is_err());

    let (status, _) = send(&h.router, Request::get("/api/trades").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn trades_lists_positions_with_legacy_keys() {
    let h = harness().await;
    let get_trades = || Request::get("/api/trades").body(Body::empty()).unwrap();

    let (status, body) = send(&h.router, get_trades()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!([]));

    let signal_id = h.store.create_signal("ETHUSD", "{}", Utc::now()).await.unwrap();
    let id = h
        .store
        .create_position(&NewPosition::open(
            signal_id, "ETHUSD", Side::Sell, 3_100.0, 3_200.0, 2_800.0,
        ))
        .await
        .unwrap();
    h.store
        .update_status(id, PositionStatus::TargetHit)
        .await
        .unwrap();

    let (_, body) = send(&h.router, get_trades()).await;
    let trades: Value = serde_json::from_slice(&body).unwrap();
    let trade = &trades[0];
    assert_eq!(trade["ID"], id);
    assert_eq!(trade["Symbol"], "ETHUSD");
    assert_eq!(trade["Side"], "SELL");
    assert_eq!(trade["Status"], "TARGET_HIT");
    assert_eq!(trade["EntryPrice"], 3100.0);
    assert_eq!(trade["StopLoss"], 3200.0);
    assert_eq!(trade["Target"], 2800.0);
    assert!(trade["Timestamp"].is_string());
}

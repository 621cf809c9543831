use crate::{handlers, websocket};
use axum::{
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use trade_engine_core::{PositionStore, StatusChange};

/// Shared handles the routes work with.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PositionStore>,
    /// Forwarded signal messages, consumed by intake.
    pub signals: mpsc::Sender<Value>,
    /// Status transitions published by the monitor.
    pub events: broadcast::Sender<StatusChange>,
}

pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    #[must_use]
    pub const fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/", get(handlers::health))
            .route("/api/signal", post(handlers::receive_signal))
            .route("/api/trades", get(handlers::list_trades))
            .route("/api/doc", get(handlers::api_doc))
            .route("/ws", get(websocket::websocket_handler))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serves until `shutdown` resolves.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve requests.
    pub async fn serve<F>(self, addr: &str, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Web API listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

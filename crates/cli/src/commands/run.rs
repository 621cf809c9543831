use super::ConfigArgs;
use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use trade_engine_data::SqlitePositionStore;
use trade_engine_intake::SignalIntake;
use trade_engine_monitor::{shutdown, MonitoringLoop, SimulatedPriceFeed};
use trade_engine_web_api::{ApiServer, AppState};

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Runs the store, price feed, monitor, intake, and HTTP server until
/// SIGINT/SIGTERM or until the server exits.
///
/// # Errors
/// Returns an error if startup fails or the HTTP server stops with an error.
pub async fn run_engine(args: RunArgs) -> Result<()> {
    let config = args.config.load()?;
    tracing::info!(config = %args.config.config, "Starting trade engine");

    let store = Arc::new(
        SqlitePositionStore::connect(&config.database.url, config.database.max_connections)
            .await
            .with_context(|| format!("Failed to open database {}", config.database.url))?,
    );
    tracing::info!(url = %config.database.url, "Database ready");

    let feed = Arc::new(SimulatedPriceFeed::new(&config.price_feed));
    let monitor = MonitoringLoop::new(store.clone(), feed.clone(), config.monitor.clone());
    let events = monitor.event_sender();

    let (signal_tx, signal_rx) = mpsc::channel(config.intake.queue_capacity.max(1));
    let intake = SignalIntake::new(store.clone());

    let (trigger, monitor_shutdown) = shutdown::channel();

    let feed_task = {
        let feed = feed.clone();
        let listener = trigger.subscribe();
        tokio::spawn(async move { feed.run(listener).await })
    };
    let monitor_task = tokio::spawn(monitor.run(monitor_shutdown));
    let intake_task = tokio::spawn(intake.run(signal_rx));

    let server = ApiServer::new(AppState {
        store: store.clone(),
        signals: signal_tx,
        events,
    });
    let addr = config.server.addr();
    let mut server_task: JoinHandle<Result<()>> = {
        let mut listener = trigger.subscribe();
        tokio::spawn(async move {
            server
                .serve(&addr, async move { listener.cancelled().await })
                .await
        })
    };

    let early_exit = tokio::select! {
        () = wait_for_shutdown_signal() => None,
        joined = &mut server_task => {
            tracing::warn!("HTTP server exited, shutting down");
            Some(joined)
        }
    };

    trigger.trigger();
    let server_result = match early_exit {
        Some(joined) => joined,
        None => server_task.await,
    };

    for (name, task) in [("price feed", feed_task), ("monitor", monitor_task)] {
        if let Err(e) = task.await {
            tracing::error!(task = name, error = %e, "Task ended abnormally");
        }
    }
    // The server held the last signal sender, so intake drains and stops.
    if let Err(e) = intake_task.await {
        tracing::error!(task = "intake", error = %e, "Task ended abnormally");
    }

    store.close().await;
    tracing::info!("Trade engine stopped");

    server_result.context("HTTP server task panicked")?
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Signal handlers unavailable, falling back to Ctrl+C");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Received Ctrl+C, initiating graceful shutdown");
    }
}

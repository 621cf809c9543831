//! Periodic stop-loss / target evaluation of open positions.

use crate::report::ReportThrottle;
use crate::shutdown::Shutdown;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use trade_engine_core::{
    evaluate_exit, ExitDecision, MonitorConfig, Position, PositionStatus, PositionStore, Quote,
    QuoteSource, StatusChange,
};
use trade_engine_data::{ResilientStore, WriteOutcome};

/// Counters for one pass over the open positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Positions that received a usable quote and were checked.
    pub evaluated: usize,
    pub stop_loss_hits: usize,
    pub target_hits: usize,
    /// Positions left alone: unknown quote, or already closed by someone else.
    pub skipped: usize,
    /// Store calls that failed or timed out.
    pub failures: usize,
}

impl CycleReport {
    #[must_use]
    pub const fn transitions(&self) -> usize {
        self.stop_loss_hits + self.target_hits
    }
}

pub struct MonitoringLoop {
    store: ResilientStore<dyn PositionStore>,
    quotes: Arc<dyn QuoteSource>,
    config: MonitorConfig,
    events: broadcast::Sender<StatusChange>,
    throttle: ReportThrottle,
}

impl MonitoringLoop {
    #[must_use]
    pub fn new(
        store: Arc<dyn PositionStore>,
        quotes: Arc<dyn QuoteSource>,
        config: MonitorConfig,
    ) -> Self {
        let mut store = ResilientStore::new(store);
        if config.call_timeout_ms > 0 {
            store = store.with_call_timeout(config.call_timeout());
        }
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let throttle = ReportThrottle::new(config.report_every_minutes);
        Self {
            store,
            quotes,
            config,
            events,
            throttle,
        }
    }

    /// Receives every committed status transition from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StatusChange> {
        self.events.subscribe()
    }

    /// Sender half, for components that hand out their own subscriptions.
    #[must_use]
    pub fn event_sender(&self) -> broadcast::Sender<StatusChange> {
        self.events.clone()
    }

    /// Runs cycles until `shutdown` fires. The poll interval is a pause
    /// after each cycle finishes, so a slow cycle never shortens the next wait.
    pub async fn run(mut self, mut shutdown: Shutdown) {
        info!(
            poll_interval_secs = self.config.poll_interval_secs,
            guarded_updates = self.config.guarded_updates,
            "Monitoring loop started"
        );

        while !shutdown.is_cancelled() {
            let report = self.run_cycle(&shutdown).await;
            debug!(?report, "Monitoring cycle finished");

            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(self.config.poll_interval()) => {}
            }
        }

        info!("Monitoring loop stopped");
    }

    /// One pass over every open position.
    ///
    /// Failures are counted and logged, never returned. Cancellation is
    /// checked before each position, so a cancelled cycle makes no further
    /// store or quote calls.
    pub async fn run_cycle(&mut self, shutdown: &Shutdown) -> CycleReport {
        let mut report = CycleReport::default();
        if shutdown.is_cancelled() {
            return report;
        }

        let store = Arc::clone(self.store.inner());
        let positions = match self
            .store
            .guarded("list_open_positions", store.list_open_positions())
            .await
        {
            Ok(positions) => positions,
            Err(_) => {
                report.failures += 1;
                return report;
            }
        };

        for position in positions {
            if shutdown.is_cancelled() {
                debug!("Cancelled mid-cycle");
                break;
            }
            self.check_position(&position, &mut report).await;
        }

        report
    }

    async fn check_position(&mut self, position: &Position, report: &mut CycleReport) {
        let raw = self.quotes.get_price(&position.symbol);

        if self.throttle.should_report(Utc::now()) {
            info!(position = %position, price = raw, "Position report");
        }

        let Some(price) = Quote::from_raw(raw).price() else {
            warn!(
                position_id = position.id,
                symbol = %position.symbol,
                raw,
                "No usable quote, skipping evaluation"
            );
            report.skipped += 1;
            return;
        };
        report.evaluated += 1;

        let decision = evaluate_exit(position, price);
        let Some(status) = decision.status() else {
            return;
        };

        let outcome = if self.config.guarded_updates {
            self.store.update_status_if_open(position.id, status).await
        } else {
            self.store.update_status(position.id, status).await
        };

        match outcome {
            WriteOutcome::Applied => {
                match decision {
                    ExitDecision::StopLossHit => report.stop_loss_hits += 1,
                    ExitDecision::TargetHit => report.target_hits += 1,
                    ExitDecision::Hold => {}
                }
                info!(
                    position_id = position.id,
                    symbol = %position.symbol,
                    side = %position.side,
                    price,
                    status = %status,
                    "Position closed by monitor"
                );
                self.publish(position, status, price);
            }
            WriteOutcome::Skipped => {
                debug!(
                    position_id = position.id,
                    "Position left Open state before the write, not overwritten"
                );
                report.skipped += 1;
            }
            WriteOutcome::Dropped => report.failures += 1,
        }
    }

    fn publish(&self, position: &Position, to: PositionStatus, price: f64) {
        // No subscribers is fine.
        let _ = self.events.send(StatusChange {
            position_id: position.id,
            symbol: position.symbol.clone(),
            side: position.side,
            from: position.status,
            to,
            price,
            at: Utc::now(),
        });
    }
}

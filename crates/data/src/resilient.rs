//! Degrade-to-default policy over a [`PositionStore`].
//!
//! Reads that fail come back empty, writes that fail are dropped, and every
//! failure is logged. Callers that need to tell "no data" from "store
//! unreachable" should use the inner store directly.

use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use trade_engine_core::{NewPosition, Position, PositionStatus, PositionStore, StorageError};

/// Result of a write issued through [`ResilientStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The store accepted the write.
    Applied,
    /// A guarded write found the position no longer `Open`.
    Skipped,
    /// The write failed and was dropped.
    Dropped,
}

pub struct ResilientStore<S: PositionStore + ?Sized> {
    inner: Arc<S>,
    call_timeout: Option<Duration>,
}

impl<S: PositionStore + ?Sized> Clone for ResilientStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            call_timeout: self.call_timeout,
        }
    }
}

impl<S: PositionStore + ?Sized> ResilientStore<S> {
    #[must_use]
    pub const fn new(inner: Arc<S>) -> Self {
        Self {
            inner,
            call_timeout: None,
        }
    }

    /// Bounds every call; an elapsed call counts as `StorageError::Timeout`.
    #[must_use]
    pub fn with_call_timeout(mut self, limit: Duration) -> Self {
        self.call_timeout = Some(limit);
        self
    }

    #[must_use]
    pub const fn inner(&self) -> &Arc<S> {
        &self.inner
    }

    /// Runs one store call under the configured timeout, logging failures.
    ///
    /// # Errors
    /// Returns the store's error, or `StorageError::Timeout` if the call
    /// exceeded the limit.
    pub async fn guarded<T, F>(&self, op: &'static str, call: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>> + Send,
    {
        let result = match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(StorageError::Timeout(limit))),
            None => call.await,
        };

        if let Err(e) = &result {
            tracing::error!(op, error = %e, "Store call failed");
        }
        result
    }

    pub async fn list_open_positions(&self) -> Vec<Position> {
        self.guarded("list_open_positions", self.inner.list_open_positions())
            .await
            .unwrap_or_default()
    }

    pub async fn find_open_positions_by_symbol(&self, symbol: &str) -> Vec<Position> {
        self.guarded(
            "find_open_positions_by_symbol",
            self.inner.find_open_positions_by_symbol(symbol),
        )
        .await
        .unwrap_or_default()
    }

    pub async fn list_positions(&self) -> Vec<Position> {
        self.guarded("list_positions", self.inner.list_positions())
            .await
            .unwrap_or_default()
    }

    pub async fn get_position(&self, id: i64) -> Option<Position> {
        self.guarded("get_position", self.inner.get_position(id))
            .await
            .ok()
            .flatten()
    }

    pub async fn create_signal(
        &self,
        symbol: &str,
        raw_payload: &str,
        received_at: DateTime<Utc>,
    ) -> Option<i64> {
        self.guarded(
            "create_signal",
            self.inner.create_signal(symbol, raw_payload, received_at),
        )
        .await
        .ok()
    }

    pub async fn create_position(&self, position: &NewPosition) -> Option<i64> {
        self.guarded("create_position", self.inner.create_position(position))
            .await
            .ok()
    }

    pub async fn update_status(&self, id: i64, status: PositionStatus) -> WriteOutcome {
        match self
            .guarded("update_status", self.inner.update_status(id, status))
            .await
        {
            Ok(()) => WriteOutcome::Applied,
            Err(_) => WriteOutcome::Dropped,
        }
    }

    pub async fn update_status_if_open(&self, id: i64, status: PositionStatus) -> WriteOutcome {
        match self
            .guarded(
                "update_status_if_open",
                self.inner.update_status_if_open(id, status),
            )
            .await
        {
            Ok(true) => WriteOutcome::Applied,
            Ok(false) => WriteOutcome::Skipped,
            Err(_) => WriteOutcome::Dropped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqlitePositionStore;
    use trade_engine_core::Side;

    async fn seeded() -> (Arc<SqlitePositionStore>, i64) {
        let store = Arc::new(SqlitePositionStore::in_memory().await.unwrap());
        let signal_id = store.create_signal("ETHUSD", "{}", Utc::now()).await.unwrap();
        let id = store
            .create_position(&NewPosition::open(
                signal_id, "ETHUSD", Side::Buy, 3_000.0, 2_900.0, 3_500.0,
            ))
            .await
            .unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn healthy_store_passes_through() {
        let (store, id) = seeded().await;
        let resilient = ResilientStore::new(store);

        let open = resilient.list_open_positions().await;
        assert_eq!(open.len(), 1);
        assert_eq!(
            resilient
                .update_status_if_open(id, PositionStatus::TargetHit)
                .await,
            WriteOutcome::Applied
        );
        assert_eq!(
            resilient
                .update_status_if_open(id, PositionStatus::StopLossHit)
                .await,
            WriteOutcome::Skipped
        );
        assert_eq!(
            resilient.get_position(id).await.unwrap().status,
            PositionStatus::TargetHit
        );
    }

    #[tokio::test]
    async fn unreachable_store_degrades_to_defaults() {
        let (store, id) = seeded().await;
        store.close().await;
        let resilient = ResilientStore::new(store);

        assert!(resilient.list_open_positions().await.is_empty());
        assert!(resilient.find_open_positions_by_symbol("ETHUSD").await.is_empty());
        assert!(resilient.list_positions().await.is_empty());
        assert!(resilient.get_position(id).await.is_none());
        assert!(resilient.create_signal("ETHUSD", "{}", Utc::now()).await.is_none());
        assert_eq!(
            resilient.update_status(id, PositionStatus::Closed).await,
            WriteOutcome::Dropped
        );
        assert_eq!(
            resilient
                .update_status_if_open(id, PositionStatus::Closed)
                .await,
            WriteOutcome::Dropped
        );
    }

    #[tokio::test]
    async fn guarded_reports_explicit_error() {
        let (store, _) = seeded().await;
        store.close().await;
        let resilient = ResilientStore::new(Arc::clone(&store));

        let err = resilient
            .guarded("list_open_positions", store.list_open_positions())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Connection(_)));
    }

    #[tokio::test]
    async fn slow_calls_time_out() {
        let (store, _) = seeded().await;
        let resilient =
            ResilientStore::new(store).with_call_timeout(Duration::from_millis(50));

        let err = resilient
            .guarded("slow", async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, StorageError>(())
            })
            .await
            .unwrap_err();
        assert_eq!(err, StorageError::Timeout(Duration::from_millis(50)));
    }
}

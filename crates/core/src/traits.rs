use crate::error::StorageError;
use crate::position::{NewPosition, Position, PositionStatus, Signal};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Durable record of signals and positions.
///
/// Every call is a single statement against the backing store. Nothing here
/// is transactional across calls: a read followed by a write from another
/// caller is never atomic as a pair.
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Appends a signal. Signals are never deduplicated.
    async fn create_signal(
        &self,
        symbol: &str,
        raw_payload: &str,
        received_at: DateTime<Utc>,
    ) -> Result<i64, StorageError>;

    /// Inserts a position and returns its id. The referenced signal must exist.
    async fn create_position(&self, position: &NewPosition) -> Result<i64, StorageError>;

    async fn get_signal(&self, id: i64) -> Result<Option<Signal>, StorageError>;

    async fn get_position(&self, id: i64) -> Result<Option<Position>, StorageError>;

    /// Open positions for `symbol`, in store order.
    async fn find_open_positions_by_symbol(
        &self,
        symbol: &str,
    ) -> Result<Vec<Position>, StorageError>;

    /// Every open position, in store order. Rows that fail to decode are
    /// left out rather than failing the listing.
    async fn list_open_positions(&self) -> Result<Vec<Position>, StorageError>;

    /// Every position regardless of status, newest first.
    async fn list_positions(&self) -> Result<Vec<Position>, StorageError>;

    /// Overwrites the status. Unknown ids are a no-op, and the prior status
    /// is not checked.
    async fn update_status(&self, id: i64, status: PositionStatus) -> Result<(), StorageError>;

    /// Writes `status` only if the position is still `Open`.
    /// Returns whether a row changed.
    async fn update_status_if_open(
        &self,
        id: i64,
        status: PositionStatus,
    ) -> Result<bool, StorageError>;
}

/// Latest known price per symbol.
pub trait QuoteSource: Send + Sync {
    /// Most recent price for `symbol`, or `0.0` if it was never observed.
    fn get_price(&self, symbol: &str) -> f64;
}

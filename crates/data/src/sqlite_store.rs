use crate::error::storage_error;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use trade_engine_core::{
    NewPosition, Position, PositionStatus, PositionStore, Side, Signal, StorageError,
};

const POSITION_COLUMNS: &str =
    "id, signal_id, symbol, side, entry_price, stop_loss, target, status, created_at";

/// `SQLite` backed [`PositionStore`].
///
/// Each operation is one statement on a pooled connection; the pool lets
/// intake and the monitoring loop use the store concurrently.
#[derive(Clone)]
pub struct SqlitePositionStore {
    pool: SqlitePool,
}

impl SqlitePositionStore {
    /// Opens (creating if missing) the database and runs migrations.
    ///
    /// # Arguments
    ///
    /// * `database_url` - `SQLite` URL (e.g., `sqlite://TradeExecution.db`)
    /// * `max_connections` - pool size
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid, the connection fails, or migrations fail.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database url {database_url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database {database_url}"))?;

        Self::from_pool(pool).await
    }

    /// Creates a private in-memory database.
    ///
    /// The pool holds exactly one connection that never expires; an in-memory
    /// `SQLite` database lives only as long as its connection.
    ///
    /// # Errors
    ///
    /// Returns error if connection or migrations fail.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self { pool })
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Closes the pool. Every later call fails with `StorageError::Connection`.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(sqlx::FromRow)]
struct SignalRow {
    id: i64,
    symbol: String,
    full_signal: String,
    received_at: DateTime<Utc>,
}

impl From<SignalRow> for Signal {
    fn from(row: SignalRow) -> Self {
        Self {
            id: row.id,
            symbol: row.symbol,
            raw_payload: row.full_signal,
            received_at: row.received_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PositionRow {
    id: i64,
    signal_id: i64,
    symbol: String,
    side: String,
    entry_price: f64,
    stop_loss: f64,
    target: f64,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PositionRow> for Position {
    type Error = StorageError;

    fn try_from(row: PositionRow) -> Result<Self, Self::Error> {
        let side = Side::parse(&row.side).ok_or_else(|| {
            StorageError::Decode(format!("position {} has unknown side {:?}", row.id, row.side))
        })?;
        let status = PositionStatus::parse(&row.status).ok_or_else(|| {
            StorageError::Decode(format!(
                "position {} has unknown status {:?}",
                row.id, row.status
            ))
        })?;

        Ok(Self {
            id: row.id,
            signal_id: row.signal_id,
            symbol: row.symbol,
            side,
            entry_price: row.entry_price,
            stop_loss: row.stop_loss,
            target: row.target,
            status,
            created_at: row.created_at,
        })
    }
}

/// Decodes listed rows. A row that cannot be decoded is logged and left out
/// so the rest of the listing stays usable; single-row reads still fail.
fn into_positions(rows: Vec<PositionRow>) -> Vec<Position> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id;
            match Position::try_from(row) {
                Ok(position) => Some(position),
                Err(e) => {
                    tracing::error!(position_id = id, error = %e, "Skipping undecodable position row");
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl PositionStore for SqlitePositionStore {
    async fn create_signal(
        &self,
        symbol: &str,
        raw_payload: &str,
        received_at: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        let result = sqlx::query(
            "INSERT INTO signals (symbol, full_signal, received_at) VALUES (?1, ?2, ?3)",
        )
        .bind(symbol)
        .bind(raw_payload)
        .bind(received_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        let id = result.last_insert_rowid();
        tracing::debug!(signal_id = id, symbol, "Signal stored");
        Ok(id)
    }

    async fn create_position(&self, position: &NewPosition) -> Result<i64, StorageError> {
        let result = sqlx::query(
            r"
            INSERT INTO positions
                (signal_id, symbol, side, entry_price, stop_loss, target, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(position.signal_id)
        .bind(&position.symbol)
        .bind(position.side.as_str())
        .bind(position.entry_price)
        .bind(position.stop_loss)
        .bind(position.target)
        .bind(position.status.as_str())
        .bind(position.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        let id = result.last_insert_rowid();
        tracing::debug!(
            position_id = id,
            signal_id = position.signal_id,
            symbol = %position.symbol,
            side = %position.side,
            status = %position.status,
            "Position stored"
        );
        Ok(id)
    }

    async fn get_signal(&self, id: i64) -> Result<Option<Signal>, StorageError> {
        let row = sqlx::query_as::<_, SignalRow>(
            "SELECT id, symbol, full_signal, received_at FROM signals WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Signal::from))
    }

    async fn get_position(&self, id: i64) -> Result<Option<Position>, StorageError> {
        let row = sqlx::query_as::<_, PositionRow>(&format!(
            "SELECT {POSITION_COLUMNS} FROM positions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.map(Position::try_from).transpose()
    }

    async fn find_open_positions_by_symbol(
        &self,
        symbol: &str,
    ) -> Result<Vec<Position>, StorageError> {
        let rows = sqlx::query_as::<_, PositionRow>(&format!(
            "SELECT {POSITION_COLUMNS} FROM positions WHERE status = 'OPEN' AND symbol = ?1 ORDER BY id"
        ))
        .bind(symbol)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(into_positions(rows))
    }

    async fn list_open_positions(&self) -> Result<Vec<Position>, StorageError> {
        let rows = sqlx::query_as::<_, PositionRow>(&format!(
            "SELECT {POSITION_COLUMNS} FROM positions WHERE status = 'OPEN' ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(into_positions(rows))
    }

    async fn list_positions(&self) -> Result<Vec<Position>, StorageError> {
        let rows = sqlx::query_as::<_, PositionRow>(&format!(
            "SELECT {POSITION_COLUMNS} FROM positions ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(into_positions(rows))
    }

    async fn update_status(&self, id: i64, status: PositionStatus) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE positions SET status = ?1 WHERE id = ?2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        tracing::debug!(
            position_id = id,
            status = %status,
            rows = result.rows_affected(),
            "Position status written"
        );
        Ok(())
    }

    async fn update_status_if_open(
        &self,
        id: i64,
        status: PositionStatus,
    ) -> Result<bool, StorageError> {
        let result =
            sqlx::query("UPDATE positions SET status = ?1 WHERE id = ?2 AND status = 'OPEN'")
                .bind(status.as_str())
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(storage_error)?;

        let changed = result.rows_affected() > 0;
        tracing::debug!(position_id = id, status = %status, changed, "Guarded status write");
        Ok(changed)
    }
}

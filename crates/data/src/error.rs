use sqlx::error::ErrorKind;
use trade_engine_core::StorageError;

/// Maps a sqlx error onto the backend-neutral [`StorageError`] kinds.
pub(crate) fn storage_error(err: sqlx::Error) -> StorageError {
    match err {
        sqlx::Error::Database(db) => match db.kind() {
            ErrorKind::ForeignKeyViolation
            | ErrorKind::CheckViolation
            | ErrorKind::UniqueViolation
            | ErrorKind::NotNullViolation => StorageError::Constraint(db.message().to_string()),
            _ => StorageError::Query(db.message().to_string()),
        },
        sqlx::Error::PoolClosed
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::Io(_)
        | sqlx::Error::Configuration(_)
        | sqlx::Error::WorkerCrashed => StorageError::Connection(err.to_string()),
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::TypeNotFound { .. } => StorageError::Decode(err.to_string()),
        other => StorageError::Query(other.to_string()),
    }
}

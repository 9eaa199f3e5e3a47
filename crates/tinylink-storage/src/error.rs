pub use tinylink_core::error::{Result, StorageError};

pub(crate) fn map_json_error(err: serde_json::Error) -> StorageError {
    use serde_json::error::Category;

    match err.classify() {
        Category::Io => StorageError::Io(err.to_string()),
        Category::Syntax | Category::Data | Category::Eof => {
            StorageError::InvalidData(err.to_string())
        }
    }
}

pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

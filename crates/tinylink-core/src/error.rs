use thiserror::Error;

/// Result type for storage backend operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Failures raised by a storage backend.
///
/// Backends wrap their native errors (I/O, JSON, SQL driver) into one of these
/// variants so that nothing implementation-specific crosses the
/// [`Storage`](crate::Storage) boundary.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage i/o failed: {0}")]
    Io(String),
    #[error("storage serialization failed: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

/// Errors surfaced by the shortener service.
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid url: '{0}'")]
    InvalidUrl(String),
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("invalid expiration: {0}")]
    InvalidExpiration(String),
    /// Raised for codes that were never created, were deleted, or have expired.
    #[error("short code '{0}' not found")]
    ShortCodeNotFound(String),
    #[error("unable to generate a unique short code after {attempts} attempts")]
    GenerationExhausted { attempts: usize },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_become_io() {
        let err: StorageError = std::io::Error::other("disk full").into();
        assert!(matches!(err, StorageError::Io(_)));
        assert_eq!(err.to_string(), "storage i/o failed: disk full");
    }

    #[test]
    fn storage_errors_wrap_into_shortener_errors() {
        let err: ShortenerError = StorageError::Timeout("pool".into()).into();
        assert!(matches!(
            err,
            ShortenerError::Storage(StorageError::Timeout(_))
        ));
        assert_eq!(
            err.to_string(),
            "storage error: storage operation timed out: pool"
        );
    }
}

//! Error types for the Communication Bridge data layer.
//!
//! Every storage failure is surfaced as a [`StoreError`]. None of them are
//! retried automatically; callers decide whether to surface or swallow them.

use thiserror::Error;

/// A specific read or write against the store failed.
#[derive(Debug, Error)]
pub enum StorageIoError {
    #[error("storage engine error: {0}")]
    Engine(#[from] rusqlite::Error),

    #[error("quota exceeded: record payload is {size} bytes, limit is {limit} bytes")]
    QuotaExceeded { size: usize, limit: usize },

    #[error("corrupt record in {collection}: {reason}")]
    Corrupt {
        collection: &'static str,
        reason: String,
    },

    #[error("storage task did not complete: {0}")]
    Interrupted(String),
}

/// Failure taxonomy of the data layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The embedded store could not be opened. Sticky for the life of the handle.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] StorageIoError),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(
            self,
            StoreError::Io(StorageIoError::QuotaExceeded { .. })
        )
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Io(StorageIoError::Engine(err))
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Io(StorageIoError::Interrupted(err.to_string()))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_errors_are_io() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Io(StorageIoError::Engine(_))));
        assert!(!err.is_unavailable());
    }

    #[test]
    fn test_quota_message() {
        let err = StoreError::from(StorageIoError::QuotaExceeded {
            size: 2048,
            limit: 1024,
        });
        assert!(err.is_quota_exceeded());
        assert_eq!(
            err.to_string(),
            "storage I/O error: quota exceeded: record payload is 2048 bytes, limit is 1024 bytes"
        );
    }
}

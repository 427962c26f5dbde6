//! Process-wide store handle.
//!
//! The handle opens the database lazily on first use and memoizes the result,
//! so every caller (including concurrent first callers) shares one connection.
//! A failed open is memoized too: the store stays unavailable for the life of
//! the handle and every later operation reports the same reason.

use crate::domain::{StoreError, StoreResult};
use crate::infra::app_config::{AppConfig, database_path, load_config};
use crate::infra::db::database::{Database, StoreOptions};
use crate::infra::db::repository::Clock;
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::OnceCell;

static SHARED: Lazy<StoreHandle> =
    Lazy::new(|| StoreHandle::new(StoreConfig::from_app_config(&load_config())));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    InMemory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: StoreLocation,
    pub options: StoreOptions,
}

impl StoreConfig {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            options: StoreOptions::default(),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::InMemory,
            options: StoreOptions::default(),
        }
    }

    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.options.quota_bytes = Some(bytes);
        self
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            location: StoreLocation::File(database_path(config)),
            options: StoreOptions {
                quota_bytes: config.quota_bytes,
            },
        }
    }

    fn open(&self) -> StoreResult<Database> {
        match &self.location {
            StoreLocation::File(path) => Database::open_at(path.clone(), self.options),
            StoreLocation::InMemory => Database::open_in_memory(self.options),
        }
    }
}

/// Lazily opened, shared connection to the embedded store.
pub struct StoreHandle {
    config: StoreConfig,
    clock: Option<Arc<dyn Clock>>,
    cell: OnceCell<Result<Arc<Database>, String>>,
    initializations: AtomicUsize,
}

impl StoreHandle {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            clock: None,
            cell: OnceCell::new(),
            initializations: AtomicUsize::new(0),
        }
    }

    /// Replace the time source handed to repositories.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// The process-wide handle, configured from the on-disk app config.
    pub fn shared() -> &'static StoreHandle {
        &SHARED
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Open the store, or return the connection opened by an earlier call.
    pub async fn open(&self) -> StoreResult<Arc<Database>> {
        let opened = self
            .cell
            .get_or_init(|| async {
                self.initializations.fetch_add(1, Ordering::SeqCst);
                let config = self.config.clone();
                let clock = self.clock.clone();
                let result = tokio::task::spawn_blocking(move || {
                    let db = config.open()?;
                    Ok::<_, StoreError>(match clock {
                        Some(clock) => db.with_clock(clock),
                        None => db,
                    })
                })
                .await;

                match result {
                    Ok(Ok(db)) => Ok(Arc::new(db)),
                    Ok(Err(StoreError::Unavailable(reason))) => {
                        log::warn!("Store unavailable: {}", reason);
                        Err(reason)
                    }
                    Ok(Err(other)) => {
                        log::warn!("Store unavailable: {}", other);
                        Err(other.to_string())
                    }
                    Err(join) => Err(format!("store open task failed: {join}")),
                }
            })
            .await;

        match opened {
            Ok(db) => Ok(db.clone()),
            Err(reason) => Err(StoreError::Unavailable(reason.clone())),
        }
    }

    /// Run blocking store work off the async caller, after opening the store.
    pub async fn run<T, F>(&self, work: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
    {
        let db = self.open().await?;
        tokio::task::spawn_blocking(move || work(&db)).await?
    }

    /// How many times the underlying open actually ran. At most one.
    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::db::DB_FILE_NAME;

    #[tokio::test]
    async fn test_concurrent_open_converges() {
        let dir = tempfile::TempDir::new().unwrap();
        let handle = StoreHandle::new(StoreConfig::at(dir.path().join(DB_FILE_NAME)));

        let opened = futures::future::join_all((0..16).map(|_| handle.open())).await;
        let first = opened[0].as_ref().unwrap().clone();
        for db in &opened {
            assert!(Arc::ptr_eq(&first, db.as_ref().unwrap()));
        }
        assert_eq!(handle.initializations(), 1);
        assert_eq!(first.collection_names().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_open_is_sticky() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let handle = StoreHandle::new(StoreConfig::at(blocker.join(DB_FILE_NAME)));

        let first = handle.open().await.unwrap_err();
        assert!(first.is_unavailable());

        // Clearing the obstacle does not revive a handle that failed.
        std::fs::remove_file(&blocker).unwrap();
        let second = handle.run(|db| db.phrase_repo().list()).await.unwrap_err();
        assert!(second.is_unavailable());
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(handle.initializations(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_config() {
        let handle = StoreHandle::new(StoreConfig::in_memory().with_quota(1024));
        let db = handle.open().await.unwrap();
        assert!(db.path().is_none());
        assert_eq!(db.options().quota_bytes, Some(1024));
    }
}

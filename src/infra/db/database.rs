//! SQLite database setup and connection management for Communication Bridge
//! Handles opening the embedded store, creating the three collections, and
//! handing out repositories that share one connection.

use crate::domain::{StoreError, StoreResult};
use crate::infra::db::repository::{
    Clock, DbConn, PecsRepository, PhraseRepository, SettingsRepository, SystemClock,
};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Bumped only when a collection is added. Collections are additive-only.
pub const SCHEMA_VERSION: i32 = 1;

/// Names of the collections created on first use.
pub const COLLECTIONS: [&str; 3] = ["settings", "phrases", "pecs"];

/// File name of the database inside the data directory.
pub const DB_FILE_NAME: &str = "commbridge.sqlite";

/// Engine limits applied to every write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Largest inline payload (text plus data URIs) a single record may carry.
    pub quota_bytes: Option<usize>,
}

/// Database wrapper that owns the single SQLite connection
pub struct Database {
    conn: DbConn,
    path: Option<PathBuf>,
    options: StoreOptions,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Create or open the database at a specific path
    pub fn open_at(path: PathBuf, options: StoreOptions) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let conn = Connection::open(&path).map_err(|e| {
            StoreError::Unavailable(format!("cannot open {}: {e}", path.display()))
        })?;
        log::debug!("Opened store at {}", path.display());
        Self::from_connection(conn, Some(path), options)
    }

    /// Create an in-memory database (useful for testing)
    pub fn open_in_memory(options: StoreOptions) -> StoreResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Unavailable(format!("cannot open in-memory store: {e}")))?;
        Self::from_connection(conn, None, options)
    }

    fn from_connection(
        conn: Connection,
        path: Option<PathBuf>,
        options: StoreOptions,
    ) -> StoreResult<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
            options,
            clock: Arc::new(SystemClock),
        };
        db.init().map_err(|e| match e {
            StoreError::Unavailable(reason) => StoreError::Unavailable(reason),
            other => StoreError::Unavailable(format!("cannot initialize store: {other}")),
        })?;
        Ok(db)
    }

    /// Replace the time source used for `created_at`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create the collections if they are missing and record the schema version.
    fn init(&self) -> StoreResult<()> {
        let conn = self.conn.lock();
        conn.busy_timeout(Duration::from_secs(5))?;

        let existing_version: i32 =
            conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        if existing_version > SCHEMA_VERSION {
            return Err(StoreError::Unavailable(format!(
                "store schema version {existing_version} is newer than supported version {SCHEMA_VERSION}"
            )));
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                lang TEXT NOT NULL,
                voice_id TEXT NOT NULL DEFAULT '',
                volume REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS phrases (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS pecs (
                id TEXT PRIMARY KEY,
                label TEXT NOT NULL,
                phrase TEXT NOT NULL DEFAULT '',
                image_data TEXT NOT NULL DEFAULT '',
                audio_data TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_phrases_created_at ON phrases(created_at);
            CREATE INDEX IF NOT EXISTS idx_pecs_created_at ON pecs(created_at);
            "#,
        )?;

        if existing_version < SCHEMA_VERSION {
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            log::info!(
                "Initialized store schema v{} (was v{})",
                SCHEMA_VERSION,
                existing_version
            );
        }

        Ok(())
    }

    pub fn schema_version(&self) -> StoreResult<i32> {
        let conn = self.conn.lock();
        let version = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        Ok(version)
    }

    /// Known collections present in the store, sorted by name. Foreign tables are ignored.
    pub fn collection_names(&self) -> StoreResult<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut names = Vec::with_capacity(COLLECTIONS.len());
        for name in rows {
            let name = name?;
            if COLLECTIONS.contains(&name.as_str()) {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Get a reference to the connection
    pub fn connection(&self) -> DbConn {
        self.conn.clone()
    }

    /// Path backing this database, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    pub fn settings_repo(&self) -> SettingsRepository {
        SettingsRepository::new(self.connection(), self.clock.clone(), self.options)
    }

    pub fn phrase_repo(&self) -> PhraseRepository {
        PhraseRepository::new(self.connection(), self.clock.clone(), self.options)
    }

    pub fn pecs_repo(&self) -> PecsRepository {
        PecsRepository::new(self.connection(), self.clock.clone(), self.options)
    }
}

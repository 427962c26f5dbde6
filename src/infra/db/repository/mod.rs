//! Repository implementations for data access in Communication Bridge.
//!
//! One generic [`CollectionRepository`] serves all three collections; each
//! record kind describes its table through the [`Record`] trait.

mod pecs;
mod phrase;
mod settings;

pub use settings::SETTINGS_KEY;

use crate::domain::{PecsCard, Phrase, Settings, StorageIoError, StoreError, StoreResult};
use crate::infra::db::database::StoreOptions;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

pub type DbConn = Arc<Mutex<Connection>>;

pub type SettingsRepository = CollectionRepository<Settings>;
pub type PhraseRepository = CollectionRepository<Phrase>;
pub type PecsRepository = CollectionRepository<PecsCard>;

/// Source of `created_at` timestamps.
pub trait Clock: Send + Sync {
    /// Current time in epoch milliseconds.
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that advances by a fixed step on every read. Used for seeding and tests.
#[derive(Debug)]
pub struct SteppingClock {
    next: AtomicI64,
    step: i64,
}

impl SteppingClock {
    pub fn new(start: i64, step: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now_millis(&self) -> i64 {
        self.next.fetch_add(self.step, Ordering::SeqCst)
    }
}

/// Fresh record key: a random 128-bit UUID.
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A record kind stored in its own collection.
pub trait Record: Sized + Send + 'static {
    /// Upsert input from which a full record is built.
    type Draft: Send + 'static;

    /// Table backing the collection.
    const COLLECTION: &'static str;
    const KEY_COLUMN: &'static str;
    /// Column list read by [`Record::from_row`], in order.
    const COLUMNS: &'static str;
    const ORDER_BY: &'static str;

    fn key(&self) -> &str;

    /// Bytes of inline payload the record carries, checked against the quota.
    fn payload_len(&self) -> usize;

    fn fresh_key() -> String {
        new_record_id()
    }

    /// Build the full record, applying defaults and validation.
    fn build(draft: Self::Draft, key: String, now_ms: i64) -> StoreResult<Self>;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Insert-or-replace the whole record.
    fn write(&self, conn: &Connection) -> rusqlite::Result<usize>;
}

/// CRUD over one collection.
pub struct CollectionRepository<R> {
    conn: DbConn,
    clock: Arc<dyn Clock>,
    options: StoreOptions,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> CollectionRepository<R> {
    pub fn new(conn: DbConn, clock: Arc<dyn Clock>, options: StoreOptions) -> Self {
        Self {
            conn,
            clock,
            options,
            _record: PhantomData,
        }
    }

    /// Point lookup. `Ok(None)` when nothing was ever saved under `key`.
    pub fn get(&self, key: &str) -> StoreResult<Option<R>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            R::COLUMNS,
            R::COLLECTION,
            R::KEY_COLUMN
        );
        conn.query_row(&sql, [key], R::from_row)
            .optional()
            .map_err(|e| read_error(R::COLLECTION, e))
    }

    /// Full scan in creation order.
    pub fn list(&self) -> StoreResult<Vec<R>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            R::COLUMNS,
            R::COLLECTION,
            R::ORDER_BY
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], R::from_row)?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| read_error(R::COLLECTION, e))
    }

    /// Insert under a fresh key, or replace the record at `key`. Returns the effective key.
    pub fn upsert(&self, draft: R::Draft, key: Option<String>) -> StoreResult<String> {
        let key = key.unwrap_or_else(R::fresh_key);
        let record = R::build(draft, key, self.clock.now_millis())?;
        self.put(&record)?;
        Ok(record.key().to_string())
    }

    /// Write an already built record.
    pub fn put(&self, record: &R) -> StoreResult<()> {
        if let Some(limit) = self.options.quota_bytes {
            let size = record.payload_len();
            if size > limit {
                log::warn!(
                    "Rejected write to {}: {} bytes exceeds quota of {} bytes",
                    R::COLLECTION,
                    size,
                    limit
                );
                return Err(StorageIoError::QuotaExceeded { size, limit }.into());
            }
        }

        let conn = self.conn.lock();
        record.write(&conn).map_err(|e| {
            log::warn!("Write to {} failed: {}", R::COLLECTION, e);
            StoreError::from(e)
        })?;
        log::debug!("Wrote {} record {}", R::COLLECTION, record.key());
        Ok(())
    }

    /// Remove the record at `key`. Removing an absent key is a no-op.
    pub fn delete(&self, key: &str) -> StoreResult<()> {
        let conn = self.conn.lock();
        let sql = format!("DELETE FROM {} WHERE {} = ?1", R::COLLECTION, R::KEY_COLUMN);
        let affected = conn.execute(&sql, [key])?;
        log::debug!(
            "Deleted {} record {} ({} row(s))",
            R::COLLECTION,
            key,
            affected
        );
        Ok(())
    }
}

impl<R> Clone for CollectionRepository<R> {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            clock: self.clock.clone(),
            options: self.options,
            _record: PhantomData,
        }
    }
}

/// Row decoding failures mean the stored record does not match its schema.
fn read_error(collection: &'static str, err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => StorageIoError::Corrupt {
            collection,
            reason: err.to_string(),
        }
        .into(),
        other => other.into(),
    }
}

/// Trimmed copy of a required text field, or `InvalidRecord` when blank.
pub(crate) fn required_text(field: &str, value: &str) -> StoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidRecord(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

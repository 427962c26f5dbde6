use super::{CollectionRepository, Record, required_text};
use crate::domain::{Phrase, StoreResult};
use rusqlite::{Connection, Row, params};

impl Record for Phrase {
    type Draft = String;

    const COLLECTION: &'static str = "phrases";
    const KEY_COLUMN: &'static str = "id";
    const COLUMNS: &'static str = "id, text, created_at";
    const ORDER_BY: &'static str = "created_at ASC, rowid ASC";

    fn key(&self) -> &str {
        &self.id
    }

    fn payload_len(&self) -> usize {
        self.text.len()
    }

    fn build(text: String, key: String, now_ms: i64) -> StoreResult<Self> {
        Ok(Phrase {
            id: key,
            text: required_text("phrase text", &text)?,
            created_at: now_ms,
        })
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Phrase {
            id: row.get(0)?,
            text: row.get(1)?,
            created_at: row.get(2)?,
        })
    }

    fn write(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT OR REPLACE INTO phrases (id, text, created_at) VALUES (?1, ?2, ?3)",
            params![self.id, self.text, self.created_at],
        )
    }
}

impl CollectionRepository<Phrase> {
    pub fn upsert_text(&self, text: &str, id: Option<String>) -> StoreResult<String> {
        self.upsert(text.to_string(), id)
    }
}

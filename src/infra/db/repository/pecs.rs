use super::{Record, required_text};
use crate::domain::{DataUri, PecsCard, PecsDraft, StoreError, StoreResult};
use rusqlite::{Connection, Row, params};

impl Record for PecsCard {
    type Draft = PecsDraft;

    const COLLECTION: &'static str = "pecs";
    const KEY_COLUMN: &'static str = "id";
    const COLUMNS: &'static str = "id, label, phrase, image_data, audio_data, created_at";
    const ORDER_BY: &'static str = "created_at ASC, rowid ASC";

    fn key(&self) -> &str {
        &self.id
    }

    fn payload_len(&self) -> usize {
        self.label.len() + self.phrase.len() + self.image_data.len() + self.audio_data.len()
    }

    fn build(draft: PecsDraft, key: String, now_ms: i64) -> StoreResult<Self> {
        let PecsDraft {
            required,
            overrides,
        } = draft;
        let image_data = inline_media("image", overrides.image_data)?;
        let audio_data = inline_media("audio", overrides.audio_data)?;

        Ok(PecsCard {
            id: key,
            label: required_text("card label", &required.label)?,
            phrase: overrides.phrase.unwrap_or_default().trim().to_string(),
            image_data,
            audio_data,
            created_at: now_ms,
        })
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(PecsCard {
            id: row.get(0)?,
            label: row.get(1)?,
            phrase: row.get(2)?,
            image_data: row.get(3)?,
            audio_data: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn write(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            r#"
            INSERT OR REPLACE INTO pecs (id, label, phrase, image_data, audio_data, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                self.id,
                self.label,
                self.phrase,
                self.image_data,
                self.audio_data,
                self.created_at
            ],
        )
    }
}

/// Absent payloads become empty strings; present ones must be base64 data URIs.
fn inline_media(kind: &str, value: Option<String>) -> StoreResult<String> {
    match value {
        None => Ok(String::new()),
        Some(value) if value.trim().is_empty() => Ok(String::new()),
        Some(value) => {
            DataUri::parse(&value)
                .map_err(|reason| StoreError::InvalidRecord(format!("{kind} data: {reason}")))?;
            Ok(value)
        }
    }
}

use super::{CollectionRepository, Record, required_text};
use crate::domain::{Settings, StoreResult, clamp_volume};
use rusqlite::{Connection, Row, params};

/// The settings collection holds a single record under this key.
pub const SETTINGS_KEY: &str = "singleton";

impl Record for Settings {
    type Draft = Settings;

    const COLLECTION: &'static str = "settings";
    const KEY_COLUMN: &'static str = "key";
    const COLUMNS: &'static str = "lang, voice_id, volume";
    const ORDER_BY: &'static str = "key";

    fn key(&self) -> &str {
        SETTINGS_KEY
    }

    fn payload_len(&self) -> usize {
        self.lang.len() + self.voice_id.len() + std::mem::size_of::<f32>()
    }

    fn fresh_key() -> String {
        SETTINGS_KEY.to_string()
    }

    /// `lang` is stored as given; only a blank tag is rejected.
    fn build(draft: Settings, _key: String, _now_ms: i64) -> StoreResult<Self> {
        required_text("lang", &draft.lang)?;
        Ok(draft.clamped())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let volume: f64 = row.get(2)?;
        Ok(Settings {
            lang: row.get(0)?,
            voice_id: row.get(1)?,
            volume: clamp_volume(volume as f32),
        })
    }

    fn write(&self, conn: &Connection) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, lang, voice_id, volume) VALUES (?1, ?2, ?3, ?4)",
            params![
                SETTINGS_KEY,
                self.lang,
                self.voice_id,
                f64::from(clamp_volume(self.volume))
            ],
        )
    }
}

impl CollectionRepository<Settings> {
    /// Saved settings, or `None` on a fresh store.
    pub fn load(&self) -> StoreResult<Option<Settings>> {
        self.get(SETTINGS_KEY)
    }

    /// Create or replace the settings record as a unit.
    pub fn save(&self, settings: Settings) -> StoreResult<()> {
        self.upsert(settings, None).map(|_| ())
    }
}

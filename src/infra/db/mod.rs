//! SQLite persistence (infrastructure).

pub mod database;
pub mod repository;
pub mod store;

pub use database::{DB_FILE_NAME, Database, SCHEMA_VERSION, StoreOptions};
pub use repository::{PecsRepository, PhraseRepository, SettingsRepository};
pub use store::{StoreConfig, StoreHandle, StoreLocation};

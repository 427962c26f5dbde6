//! Boundary calls exposed to the presentation layer.
//!
//! Each call opens the shared store on first use and runs the blocking SQLite
//! work on tokio's blocking pool, so callers on an async task never block.
//! Calls are independent units of durability: nothing here spans two
//! collections, and concurrent calls are not serialized beyond what each
//! single-record statement provides.

use crate::domain::{NewPecsCard, PecsCard, PecsDraft, PecsOverrides, Phrase, Settings, StoreResult};
use crate::infra::db::StoreHandle;

pub async fn load_settings(store: &StoreHandle) -> StoreResult<Option<Settings>> {
    store.run(|db| db.settings_repo().load()).await
}

pub async fn save_settings(store: &StoreHandle, settings: Settings) -> StoreResult<()> {
    store
        .run(move |db| db.settings_repo().save(settings))
        .await
}

pub async fn list_phrases(store: &StoreHandle) -> StoreResult<Vec<Phrase>> {
    store.run(|db| db.phrase_repo().list()).await
}

/// Insert a phrase under a fresh id, or replace the phrase at `id`.
pub async fn upsert_phrase(
    store: &StoreHandle,
    text: impl Into<String>,
    id: Option<String>,
) -> StoreResult<String> {
    let text = text.into();
    store
        .run(move |db| db.phrase_repo().upsert(text, id))
        .await
}

pub async fn delete_phrase(store: &StoreHandle, id: impl Into<String>) -> StoreResult<()> {
    let id = id.into();
    store.run(move |db| db.phrase_repo().delete(&id)).await
}

pub async fn list_pecs(store: &StoreHandle) -> StoreResult<Vec<PecsCard>> {
    store.run(|db| db.pecs_repo().list()).await
}

/// Insert a card under a fresh id, or replace the card at `id`.
pub async fn upsert_pecs(
    store: &StoreHandle,
    card: NewPecsCard,
    overrides: PecsOverrides,
    id: Option<String>,
) -> StoreResult<String> {
    let draft = PecsDraft {
        required: card,
        overrides,
    };
    store
        .run(move |db| db.pecs_repo().upsert(draft, id))
        .await
}

pub async fn delete_pecs(store: &StoreHandle, id: impl Into<String>) -> StoreResult<()> {
    let id = id.into();
    store.run(move |db| db.pecs_repo().delete(&id)).await
}

//! Integration tests for the persistent store
//! These tests drive the boundary calls and the vocabulary view against real database files

use commbridge::application::{Origin, Removal, VocabularyView};
use commbridge::commands;
use commbridge::domain::{
    DEFAULT_CARDS, DEFAULT_PHRASES, NewPecsCard, PecsDraft, PecsOverrides, Settings, StoreError,
};
use commbridge::infra::db::repository::SteppingClock;
use commbridge::infra::db::{DB_FILE_NAME, Database, SCHEMA_VERSION, StoreConfig, StoreHandle};
use std::sync::Arc;

fn file_store(dir: &tempfile::TempDir) -> StoreHandle {
    StoreHandle::new(StoreConfig::at(dir.path().join(DB_FILE_NAME)))
}

#[tokio::test]
async fn test_vocabulary_survives_restart() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;

    {
        let store = file_store(&dir);
        commands::save_settings(&store, Settings::new("en-GB", "urn:voice:daniel", 0.8)).await?;
        commands::upsert_phrase(&store, "My name is Sam.", None).await?;
        commands::upsert_pecs(
            &store,
            NewPecsCard::new("Coffee"),
            PecsOverrides::default().with_phrase("I would like a coffee."),
            None,
        )
        .await?;
    }

    // A new handle stands in for the next launch.
    let store = file_store(&dir);
    let view = VocabularyView::load(&store).await;
    assert!(view.is_durable());
    assert_eq!(
        view.settings(),
        &Settings::new("en-GB", "urn:voice:daniel", 0.8)
    );

    let phrases = view.phrases();
    assert_eq!(phrases.len(), DEFAULT_PHRASES.len() + 1);
    assert_eq!(phrases.last().map(|p| p.text.as_str()), Some("My name is Sam."));

    let cards = view.cards();
    assert_eq!(cards.len(), DEFAULT_CARDS.len() + 1);
    let coffee = cards.last().expect("stored card");
    assert_eq!(coffee.label, "Coffee");
    assert_eq!(coffee.spoken_text(), "I would like a coffee.");
    assert!(coffee.origin.is_removable());

    let db = store.open().await?;
    assert_eq!(db.schema_version()?, SCHEMA_VERSION);
    Ok(())
}

#[tokio::test]
async fn test_fresh_store_has_no_settings() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let store = file_store(&dir);

    assert_eq!(commands::load_settings(&store).await?, None);
    assert!(commands::list_phrases(&store).await?.is_empty());
    assert!(commands::list_pecs(&store).await?.is_empty());

    let view = VocabularyView::load(&store).await;
    assert_eq!(view.settings().lang, "en-US");
    assert_eq!(view.settings().voice_id, "");
    assert_eq!(view.settings().volume, 1.0);
    assert!(view.phrases().iter().all(|p| p.origin == Origin::BuiltIn));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_open_initializes_once() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let store = Arc::new(file_store(&dir));

    let opens = (0..32).map(|_| {
        let store = store.clone();
        tokio::spawn(async move { store.open().await })
    });
    let handles = futures::future::join_all(opens).await;

    let mut databases = Vec::new();
    for handle in handles {
        databases.push(handle??);
    }
    assert!(databases.iter().all(|db| Arc::ptr_eq(db, &databases[0])));
    assert_eq!(store.initializations(), 1);

    let mut names = databases[0].collection_names()?;
    names.sort();
    assert_eq!(names, vec!["pecs", "phrases", "settings"]);

    // Re-running initialization against the same file is harmless.
    let again = Database::open_at(dir.path().join(DB_FILE_NAME), Default::default())?;
    assert_eq!(again.schema_version()?, SCHEMA_VERSION);
    Ok(())
}

#[tokio::test]
async fn test_unavailable_store_degrades_to_session_only() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let blocker = dir.path().join("not-a-directory");
    std::fs::write(&blocker, b"file")?;
    let store = StoreHandle::new(StoreConfig::at(blocker.join(DB_FILE_NAME)));

    let err = commands::list_phrases(&store).await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
    let err = commands::upsert_phrase(&store, "Hello", None).await.unwrap_err();
    assert!(err.is_unavailable());

    let mut view = VocabularyView::load(&store).await;
    assert!(!view.is_durable());
    view.add_phrase("Only for today.").await?;
    view.set_volume(0.3).await;
    assert_eq!(view.settings().volume, 0.3);
    assert_eq!(view.phrases().len(), DEFAULT_PHRASES.len() + 1);

    assert!(matches!(
        view.remove_phrase("Only for today.").await?,
        Removal::Removed(_)
    ));
    assert_eq!(view.phrases().len(), DEFAULT_PHRASES.len());
    Ok(())
}

#[tokio::test]
async fn test_oversized_card_leaves_existing_cards() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let store =
        StoreHandle::new(StoreConfig::at(dir.path().join(DB_FILE_NAME)).with_quota(4096));
    let mut view = VocabularyView::load(&store).await;

    let bus = PecsDraft::new("Bus")
        .with_overrides(PecsOverrides::default().with_phrase("I take the bus."));
    let kept = view.add_card(bus).await?;

    let huge = format!("data:image/png;base64,{}", "A".repeat(8192));
    let poster = PecsDraft::new("Poster").with_overrides(PecsOverrides::default().with_image(huge));
    let err = view.add_card(poster).await.unwrap_err();
    assert!(err.is_quota_exceeded());

    let stored = commands::list_pecs(&store).await?;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, kept);
    assert_eq!(view.stored_cards().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_phrases_listed_in_creation_order() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let store = file_store(&dir).with_clock(Arc::new(SteppingClock::new(5_000, 1)));

    // Explicit keys sort opposite to creation order.
    commands::upsert_phrase(&store, "A", Some("zz".into())).await?;
    commands::upsert_phrase(&store, "B", Some("mm".into())).await?;
    commands::upsert_phrase(&store, "C", Some("aa".into())).await?;

    let texts: Vec<_> = commands::list_phrases(&store)
        .await?
        .into_iter()
        .map(|p| p.text)
        .collect();
    assert_eq!(texts, vec!["A", "B", "C"]);
    Ok(())
}

#[tokio::test]
async fn test_delete_card_by_label_twice() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let store = file_store(&dir);
    let mut view = VocabularyView::load(&store).await;

    let id = view.add_card(PecsDraft::new("Water")).await?;
    assert_eq!(view.remove_card("Water").await?, Removal::Removed(id));
    assert!(commands::list_pecs(&store).await?.is_empty());

    // Only the built-in card is left.
    assert_eq!(view.remove_card("Water").await?, Removal::BuiltIn);
    assert_eq!(view.remove_card("Umbrella").await?, Removal::NotFound);
    Ok(())
}

#[tokio::test]
async fn test_deleting_absent_keys_is_a_no_op() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let store = file_store(&dir);

    commands::delete_phrase(&store, "never-saved").await?;
    commands::delete_pecs(&store, "never-saved").await?;
    Ok(())
}

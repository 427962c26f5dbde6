//! Rendered vocabulary kept in step with the store.
//!
//! The view never edits its lists independently of the store: every add or
//! remove goes through the boundary calls and is followed by a fresh `list()`
//! of the affected collection. The rendered vocabulary is always the built-in
//! defaults followed by the stored records.
//!
//! When the store cannot be opened the view falls back to in-memory-only
//! operation: edits work for the session but are not durable.

use crate::commands;
use crate::domain::{
    DEFAULT_CARDS, DEFAULT_PHRASES, PecsCard, PecsDraft, Phrase, Settings, StoreError,
    StoreResult,
};
use crate::infra::db::StoreHandle;
use crate::infra::db::repository::{Clock, Record, SystemClock, new_record_id};
use serde::Serialize;

/// Where a rendered entry comes from. Only stored entries can be removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Origin {
    BuiltIn,
    Stored(String),
}

impl Origin {
    pub fn is_removable(&self) -> bool {
        matches!(self, Origin::Stored(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhraseEntry {
    pub text: String,
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardEntry {
    pub label: String,
    pub phrase: String,
    /// Bundled image path for built-ins, data URI (possibly empty) for stored cards.
    pub image: String,
    /// Recorded audio data URI, empty when the card has none.
    pub audio: String,
    pub origin: Origin,
}

impl CardEntry {
    pub fn spoken_text(&self) -> &str {
        if self.phrase.trim().is_empty() {
            &self.label
        } else {
            &self.phrase
        }
    }

    pub fn has_recording(&self) -> bool {
        !self.audio.is_empty()
    }
}

impl From<&PecsCard> for CardEntry {
    fn from(card: &PecsCard) -> Self {
        Self {
            label: card.label.clone(),
            phrase: card.phrase.clone(),
            image: card.image_data.clone(),
            audio: card.audio_data.clone(),
            origin: Origin::Stored(card.id.clone()),
        }
    }
}

/// Outcome of a remove-by-value request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// A stored record with this id was deleted.
    Removed(String),
    /// The value only matches a built-in entry, which cannot be deleted.
    BuiltIn,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    Durable,
    InMemory,
}

pub struct VocabularyView<'s> {
    store: &'s StoreHandle,
    persistence: Persistence,
    settings: Settings,
    phrases: Vec<Phrase>,
    cards: Vec<PecsCard>,
    stale_phrases: bool,
    stale_cards: bool,
}

impl<'s> VocabularyView<'s> {
    /// Read settings and both collections once.
    ///
    /// An unavailable store switches the view to in-memory operation. Other
    /// read failures are logged and leave the affected list empty.
    pub async fn load(store: &'s StoreHandle) -> Self {
        let mut view = Self {
            store,
            persistence: Persistence::Durable,
            settings: Settings::default(),
            phrases: Vec::new(),
            cards: Vec::new(),
            stale_phrases: false,
            stale_cards: false,
        };

        match commands::load_settings(store).await {
            Ok(Some(settings)) => view.settings = settings,
            Ok(None) => log::debug!("No saved settings, using defaults"),
            Err(err) => view.note_load_failure("settings", err),
        }

        if view.is_durable() {
            let (phrases, cards) =
                futures::join!(commands::list_phrases(store), commands::list_pecs(store));
            match phrases {
                Ok(phrases) => view.phrases = phrases,
                Err(err) => {
                    view.stale_phrases = true;
                    view.note_load_failure("phrases", err);
                }
            }
            match cards {
                Ok(cards) => view.cards = cards,
                Err(err) => {
                    view.stale_cards = true;
                    view.note_load_failure("pecs", err);
                }
            }
        }

        view
    }

    fn note_load_failure(&mut self, what: &str, err: StoreError) {
        if err.is_unavailable() {
            log::warn!("{}; continuing without persistence", err);
            self.persistence = Persistence::InMemory;
        } else {
            log::warn!("Failed to load {}: {}", what, err);
        }
    }

    pub fn persistence(&self) -> Persistence {
        self.persistence
    }

    pub fn is_durable(&self) -> bool {
        self.persistence == Persistence::Durable
    }

    /// True when a collection could not be re-read and the rendered lists may
    /// lag behind the store.
    pub fn is_stale(&self) -> bool {
        self.stale_phrases || self.stale_cards
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stored_phrases(&self) -> &[Phrase] {
        &self.phrases
    }

    pub fn stored_cards(&self) -> &[PecsCard] {
        &self.cards
    }

    /// Built-in phrases followed by stored phrases in creation order.
    pub fn phrases(&self) -> Vec<PhraseEntry> {
        let defaults = DEFAULT_PHRASES.iter().map(|text| PhraseEntry {
            text: (*text).to_string(),
            origin: Origin::BuiltIn,
        });
        let stored = self.phrases.iter().map(|p| PhraseEntry {
            text: p.text.clone(),
            origin: Origin::Stored(p.id.clone()),
        });
        defaults.chain(stored).collect()
    }

    /// Built-in cards followed by stored cards in creation order.
    pub fn cards(&self) -> Vec<CardEntry> {
        let defaults = DEFAULT_CARDS.iter().map(|card| CardEntry {
            label: card.label.to_string(),
            phrase: card.phrase.to_string(),
            image: card.image.to_string(),
            audio: String::new(),
            origin: Origin::BuiltIn,
        });
        defaults.chain(self.cards.iter().map(CardEntry::from)).collect()
    }

    pub async fn refresh_phrases(&mut self) -> StoreResult<()> {
        if self.is_durable() {
            let listed = commands::list_phrases(self.store).await;
            self.stale_phrases = listed.is_err();
            self.phrases = listed?;
        }
        Ok(())
    }

    pub async fn refresh_cards(&mut self) -> StoreResult<()> {
        if self.is_durable() {
            let listed = commands::list_pecs(self.store).await;
            self.stale_cards = listed.is_err();
            self.cards = listed?;
        }
        Ok(())
    }

    /// Store a new phrase and re-read the collection. Returns the new id.
    ///
    /// On failure the rendered list is left exactly as it was. A failed re-read
    /// after a committed write only marks the view stale.
    pub async fn add_phrase(&mut self, text: &str) -> StoreResult<String> {
        if !self.is_durable() {
            let phrase = Phrase::build(text.to_string(), new_record_id(), now_millis())?;
            let id = phrase.id.clone();
            self.phrases.push(phrase);
            return Ok(id);
        }

        let id = commands::upsert_phrase(self.store, text, None)
            .await
            .inspect_err(|err| log::warn!("Failed to add phrase: {}", err))?;
        if let Err(err) = self.refresh_phrases().await {
            log::warn!("Phrase {} saved but phrases not re-read: {}", id, err);
        }
        Ok(id)
    }

    /// Remove the first stored phrase whose text matches, resolved against a fresh read.
    pub async fn remove_phrase(&mut self, text: &str) -> StoreResult<Removal> {
        self.refresh_phrases().await?;
        let text = text.trim();

        let Some(found) = self.phrases.iter().position(|p| p.text == text) else {
            return Ok(if DEFAULT_PHRASES.contains(&text) {
                Removal::BuiltIn
            } else {
                Removal::NotFound
            });
        };

        let id = self.phrases[found].id.clone();
        if self.is_durable() {
            commands::delete_phrase(self.store, id.as_str())
                .await
                .inspect_err(|err| log::warn!("Failed to remove phrase {}: {}", id, err))?;
            if let Err(err) = self.refresh_phrases().await {
                log::warn!("Phrase {} removed but phrases not re-read: {}", id, err);
                self.phrases.remove(found);
            }
        } else {
            self.phrases.remove(found);
        }
        Ok(Removal::Removed(id))
    }

    /// Store a new card and re-read the collection. Returns the new id.
    pub async fn add_card(&mut self, draft: PecsDraft) -> StoreResult<String> {
        if !self.is_durable() {
            let card = PecsCard::build(draft, new_record_id(), now_millis())?;
            let id = card.id.clone();
            self.cards.push(card);
            return Ok(id);
        }

        let PecsDraft {
            required,
            overrides,
        } = draft;
        let id = commands::upsert_pecs(self.store, required, overrides, None)
            .await
            .inspect_err(|err| log::warn!("Failed to add card: {}", err))?;
        if let Err(err) = self.refresh_cards().await {
            log::warn!("Card {} saved but cards not re-read: {}", id, err);
        }
        Ok(id)
    }

    /// Remove the first stored card whose label matches, resolved against a fresh read.
    pub async fn remove_card(&mut self, label: &str) -> StoreResult<Removal> {
        self.refresh_cards().await?;
        let label = label.trim();

        let Some(found) = self.cards.iter().position(|c| c.label == label) else {
            return Ok(if DEFAULT_CARDS.iter().any(|c| c.label == label) {
                Removal::BuiltIn
            } else {
                Removal::NotFound
            });
        };

        let id = self.cards[found].id.clone();
        if self.is_durable() {
            commands::delete_pecs(self.store, id.as_str())
                .await
                .inspect_err(|err| log::warn!("Failed to remove card {}: {}", id, err))?;
            if let Err(err) = self.refresh_cards().await {
                log::warn!("Card {} removed but cards not re-read: {}", id, err);
                self.cards.remove(found);
            }
        } else {
            self.cards.remove(found);
        }
        Ok(Removal::Removed(id))
    }

    pub async fn set_lang(&mut self, lang: impl Into<String>) {
        self.settings.lang = lang.into();
        self.persist_settings().await;
    }

    pub async fn set_voice(&mut self, voice_id: impl Into<String>) {
        self.settings.voice_id = voice_id.into();
        self.persist_settings().await;
    }

    pub async fn set_volume(&mut self, volume: f32) {
        self.settings = Settings {
            volume,
            ..self.settings.clone()
        }
        .clamped();
        self.persist_settings().await;
    }

    /// Save the full settings record. Failures are logged, never surfaced.
    async fn persist_settings(&mut self) {
        if !self.is_durable() {
            return;
        }
        if let Err(err) = commands::save_settings(self.store, self.settings.clone()).await {
            log::warn!("Settings not saved: {}", err);
        }
    }
}

fn now_millis() -> i64 {
    SystemClock.now_millis()
}

//! Communication Bridge CLI entry point.
//!
//! Lets a caregiver inspect and edit the stored vocabulary and voice settings.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use commbridge::application::{CardEntry, PhraseEntry, Removal, VocabularyView, plan_utterance};
use commbridge::commands;
use commbridge::domain::{DataUri, PecsDraft, PecsOverrides, Settings};
use commbridge::infra::app_config::load_config;
use commbridge::infra::db::{StoreConfig, StoreHandle};

#[derive(Parser, Debug)]
#[command(name = "commbridge")]
#[command(version)]
#[command(about = "Manage the Communication Bridge vocabulary and voice settings", long_about = None)]
struct Args {
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Database file to use instead of the configured one
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show or change voice settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Manage quick phrases
    Phrases {
        #[command(subcommand)]
        action: PhraseAction,
    },

    /// Manage picture cards
    Pecs {
        #[command(subcommand)]
        action: PecsAction,
    },

    /// Show the full vocabulary (built-ins followed by stored entries)
    Vocab,

    /// Show how the given text would be spoken
    Say {
        text: String,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    Show,
    Set {
        #[arg(long)]
        lang: Option<String>,
        /// Voice identifier; pass an empty string for automatic selection
        #[arg(long)]
        voice: Option<String>,
        /// Between 0.0 and 1.0; out-of-range values are clamped
        #[arg(long)]
        volume: Option<f32>,
    },
}

#[derive(Subcommand, Debug)]
enum PhraseAction {
    List,
    Add { text: String },
    /// Remove a stored phrase by its text
    Remove { text: String },
}

#[derive(Subcommand, Debug)]
enum PecsAction {
    List,
    Add {
        #[arg(long)]
        label: String,
        /// Spoken text; defaults to the label
        #[arg(long)]
        phrase: Option<String>,
        /// Picture file to embed
        #[arg(long)]
        image: Option<PathBuf>,
        /// Recording to embed
        #[arg(long)]
        audio: Option<PathBuf>,
    },
    /// Remove a stored card by its label
    Remove { label: String },
}

#[derive(Serialize)]
struct Vocabulary {
    phrases: Vec<PhraseEntry>,
    cards: Vec<CardEntry>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let custom;
    let store = match &args.db {
        Some(path) => {
            let mut config = StoreConfig::at(path.clone());
            config.options.quota_bytes = load_config().quota_bytes;
            custom = StoreHandle::new(config);
            &custom
        }
        None => StoreHandle::shared(),
    };

    match args.command {
        Commands::Settings { action } => settings(store, action, args.json).await,
        Commands::Phrases { action } => phrases(store, action, args.json).await,
        Commands::Pecs { action } => pecs(store, action, args.json).await,
        Commands::Vocab => {
            let view = VocabularyView::load(store).await;
            let vocabulary = Vocabulary {
                phrases: view.phrases(),
                cards: view.cards(),
            };
            if args.json {
                print_json(&vocabulary)
            } else {
                print_phrases(&vocabulary.phrases);
                print_cards(&vocabulary.cards);
                Ok(())
            }
        }
        Commands::Say { text } => {
            let settings = match commands::load_settings(store).await {
                Ok(saved) => saved.unwrap_or_default(),
                Err(err) => {
                    log::warn!("Using default settings: {}", err);
                    Settings::default()
                }
            };
            let Some(utterance) = plan_utterance(&text, &settings, &[]) else {
                bail!("Nothing to say");
            };
            if args.json {
                print_json(&utterance)
            } else {
                println!(
                    "\"{}\" in {} at {:.0}% volume",
                    utterance.text,
                    utterance.lang,
                    utterance.volume * 100.0
                );
                Ok(())
            }
        }
    }
}

async fn settings(store: &StoreHandle, action: SettingsAction, json: bool) -> Result<()> {
    let current = commands::load_settings(store).await?;
    let settings = match action {
        SettingsAction::Show => current.unwrap_or_default(),
        SettingsAction::Set {
            lang,
            voice,
            volume,
        } => {
            let base = current.unwrap_or_default();
            let updated = Settings::new(
                lang.unwrap_or(base.lang),
                voice.unwrap_or(base.voice_id),
                volume.unwrap_or(base.volume),
            );
            commands::save_settings(store, updated.clone())
                .await
                .context("Failed to save settings")?;
            updated
        }
    };

    if json {
        return print_json(&settings);
    }
    println!("Language: {}", settings.lang);
    println!(
        "Voice:    {}",
        if settings.uses_auto_voice() {
            "auto"
        } else {
            settings.voice_id.as_str()
        }
    );
    println!("Volume:   {:.0}%", settings.volume * 100.0);
    Ok(())
}

async fn phrases(store: &StoreHandle, action: PhraseAction, json: bool) -> Result<()> {
    let mut view = durable_view(store).await?;
    match action {
        PhraseAction::List => {
            if json {
                return print_json(&view.phrases());
            }
            print_phrases(&view.phrases());
        }
        PhraseAction::Add { text } => {
            let id = view.add_phrase(&text).await.context("Failed to add phrase")?;
            println!("Added phrase {id}");
        }
        PhraseAction::Remove { text } => {
            let removal = view
                .remove_phrase(&text)
                .await
                .context("Failed to remove phrase")?;
            report_removal("phrase", &text, removal)?;
        }
    }
    Ok(())
}

async fn pecs(store: &StoreHandle, action: PecsAction, json: bool) -> Result<()> {
    let mut view = durable_view(store).await?;
    match action {
        PecsAction::List => {
            if json {
                return print_json(&view.cards());
            }
            print_cards(&view.cards());
        }
        PecsAction::Add {
            label,
            phrase,
            image,
            audio,
        } => {
            let mut overrides = PecsOverrides {
                phrase,
                ..PecsOverrides::default()
            };
            if let Some(path) = image {
                let uri = DataUri::from_file(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                if !uri.is_image() {
                    bail!("{} is not a picture ({})", path.display(), uri.mime);
                }
                overrides = overrides.with_image(uri.to_string());
            }
            if let Some(path) = audio {
                let uri = DataUri::from_file(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                if !uri.is_audio() {
                    bail!("{} is not a recording ({})", path.display(), uri.mime);
                }
                overrides = overrides.with_audio(uri.to_string());
            }

            let draft = PecsDraft::new(label).with_overrides(overrides);
            let id = view.add_card(draft).await.context("Failed to add card")?;
            println!("Added card {id}");
        }
        PecsAction::Remove { label } => {
            let removal = view
                .remove_card(&label)
                .await
                .context("Failed to remove card")?;
            report_removal("card", &label, removal)?;
        }
    }
    Ok(())
}

/// Edits from the CLI must persist; refuse to work on a session-only view.
async fn durable_view(store: &StoreHandle) -> Result<VocabularyView<'_>> {
    let view = VocabularyView::load(store).await;
    if !view.is_durable() {
        // Report the underlying open failure.
        store.open().await?;
        bail!("Storage unavailable; changes would not be saved");
    }
    Ok(view)
}

fn report_removal(kind: &str, value: &str, removal: Removal) -> Result<()> {
    match removal {
        Removal::Removed(id) => {
            println!("Removed {kind} {id}");
            Ok(())
        }
        Removal::BuiltIn => bail!("\"{value}\" is a built-in {kind} and cannot be removed"),
        Removal::NotFound => {
            println!("No stored {kind} matches \"{value}\"");
            Ok(())
        }
    }
}

fn print_phrases(phrases: &[PhraseEntry]) {
    println!("Quick phrases:");
    for entry in phrases {
        let marker = if entry.origin.is_removable() { "*" } else { " " };
        println!(" {marker} {}", entry.text);
    }
}

fn print_cards(cards: &[CardEntry]) {
    println!("PECS cards:");
    for card in cards {
        let marker = if card.origin.is_removable() { "*" } else { " " };
        let recording = if card.has_recording() {
            " (has recording)"
        } else {
            ""
        };
        println!(" {marker} {}: {}{recording}", card.label, card.spoken_text());
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! Application layer (use-cases, policies).
//!
//! Consumer-side helpers built on the boundary calls: the synchronized
//! vocabulary view and speech-output planning. Neither depends on a UI
//! framework.

pub mod speech;
pub mod vocabulary;

pub use speech::{CardOutput, Utterance, Voice, plan_card, plan_utterance, select_voice};
pub use vocabulary::{CardEntry, Origin, Persistence, PhraseEntry, Removal, VocabularyView};

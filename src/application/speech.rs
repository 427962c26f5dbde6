//! Speech-output planning.
//!
//! Turns text or a tapped card into what the platform speech engine should
//! do, given the saved settings and the voices the platform offers.

use crate::application::vocabulary::CardEntry;
use crate::domain::{Settings, clamp_volume};
use serde::{Deserialize, Serialize};

/// A voice offered by the platform speech engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Stable identifier, matched against `Settings::voice_id`.
    pub id: String,
    pub name: String,
    pub lang: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub volume: f32,
    /// `None` leaves the choice to the engine.
    pub voice_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardOutput {
    /// Play the recording; speak `fallback` if playback fails.
    Recording { audio: String, fallback: Utterance },
    Speak(Utterance),
}

/// Prefer the configured voice, then the first voice for the configured language.
pub fn select_voice<'v>(voices: &'v [Voice], settings: &Settings) -> Option<&'v Voice> {
    if !settings.uses_auto_voice() {
        if let Some(voice) = voices.iter().find(|v| v.id == settings.voice_id) {
            return Some(voice);
        }
    }
    voices.iter().find(|v| v.lang == settings.lang)
}

/// `None` for blank text.
pub fn plan_utterance(text: &str, settings: &Settings, voices: &[Voice]) -> Option<Utterance> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(Utterance {
        text: text.to_string(),
        lang: settings.lang.clone(),
        volume: clamp_volume(settings.volume),
        voice_id: select_voice(voices, settings).map(|v| v.id.clone()),
    })
}

pub fn plan_card(card: &CardEntry, settings: &Settings, voices: &[Voice]) -> Option<CardOutput> {
    let utterance = plan_utterance(card.spoken_text(), settings, voices)?;
    if card.has_recording() {
        Some(CardOutput::Recording {
            audio: card.audio.clone(),
            fallback: utterance,
        })
    } else {
        Some(CardOutput::Speak(utterance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::vocabulary::Origin;

    fn voices() -> Vec<Voice> {
        vec![
            Voice {
                id: "urn:en-gb-1".into(),
                name: "Daniel".into(),
                lang: "en-GB".into(),
            },
            Voice {
                id: "urn:en-us-1".into(),
                name: "Samantha".into(),
                lang: "en-US".into(),
            },
            Voice {
                id: "urn:en-us-2".into(),
                name: "Alex".into(),
                lang: "en-US".into(),
            },
        ]
    }

    #[test]
    fn test_select_voice_prefers_id_then_lang() {
        let voices = voices();

        let by_id = Settings::new("en-US", "urn:en-gb-1", 1.0);
        assert_eq!(select_voice(&voices, &by_id).unwrap().name, "Daniel");

        let auto = Settings::default();
        assert_eq!(select_voice(&voices, &auto).unwrap().name, "Samantha");

        let unknown = Settings::new("en-US", "urn:gone", 1.0);
        assert_eq!(select_voice(&voices, &unknown).unwrap().name, "Samantha");

        let no_match = Settings::new("ja-JP", "", 1.0);
        assert!(select_voice(&voices, &no_match).is_none());
    }

    #[test]
    fn test_plan_utterance_clamps_and_trims() {
        let settings = Settings {
            lang: "en-GB".into(),
            voice_id: String::new(),
            volume: 2.0,
        };
        let utterance = plan_utterance("  I need help. ", &settings, &voices()).unwrap();
        assert_eq!(utterance.text, "I need help.");
        assert_eq!(utterance.volume, 1.0);
        assert_eq!(utterance.voice_id.as_deref(), Some("urn:en-gb-1"));

        assert!(plan_utterance("   ", &settings, &voices()).is_none());
    }

    #[test]
    fn test_plan_card() {
        let mut card = CardEntry {
            label: "Break".into(),
            phrase: String::new(),
            image: "/images/break.png".into(),
            audio: String::new(),
            origin: Origin::BuiltIn,
        };
        let settings = Settings::default();

        match plan_card(&card, &settings, &[]).unwrap() {
            CardOutput::Speak(utterance) => {
                assert_eq!(utterance.text, "Break");
                assert_eq!(utterance.voice_id, None);
            }
            other => panic!("expected speech, got {other:?}"),
        }

        card.audio = "data:audio/webm;base64,AAEC".into();
        match plan_card(&card, &settings, &[]).unwrap() {
            CardOutput::Recording { audio, fallback } => {
                assert_eq!(audio, card.audio);
                assert_eq!(fallback.text, "Break");
            }
            other => panic!("expected recording, got {other:?}"),
        }
    }
}

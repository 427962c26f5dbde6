use serde::{Deserialize, Serialize};

/// Stored quick phrase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phrase {
    pub id: String,
    pub text: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}

/// Stored picture-communication card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PecsCard {
    pub id: String,
    pub label: String,
    /// Spoken text; empty falls back to `label`.
    #[serde(default)]
    pub phrase: String,
    /// Picture as a base64 data URI, empty when absent.
    #[serde(default)]
    pub image_data: String,
    /// Recorded audio as a base64 data URI, empty when absent.
    #[serde(default)]
    pub audio_data: String,
    pub created_at: i64,
}

impl PecsCard {
    pub fn spoken_text(&self) -> &str {
        if self.phrase.trim().is_empty() {
            &self.label
        } else {
            &self.phrase
        }
    }

    pub fn has_recording(&self) -> bool {
        !self.audio_data.is_empty()
    }
}

/// Required part of a card upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPecsCard {
    pub label: String,
}

impl NewPecsCard {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

/// Optional part of a card upsert. `None` is stored as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PecsOverrides {
    pub phrase: Option<String>,
    pub image_data: Option<String>,
    pub audio_data: Option<String>,
}

impl PecsOverrides {
    pub fn with_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.phrase = Some(phrase.into());
        self
    }

    pub fn with_image(mut self, data_uri: impl Into<String>) -> Self {
        self.image_data = Some(data_uri.into());
        self
    }

    pub fn with_audio(mut self, data_uri: impl Into<String>) -> Self {
        self.audio_data = Some(data_uri.into());
        self
    }
}

/// Full card upsert input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PecsDraft {
    pub required: NewPecsCard,
    pub overrides: PecsOverrides,
}

impl PecsDraft {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            required: NewPecsCard::new(label),
            overrides: PecsOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: PecsOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Built-in card shipped with the app. Never persisted, never deletable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultCard {
    pub label: &'static str,
    pub image: &'static str,
    pub phrase: &'static str,
}

pub const DEFAULT_PHRASES: &[&str] = &[
    "I need help.",
    "Thank you.",
    "Please repeat that.",
    "Can you write it down?",
    "I'm calling about...",
];

pub const DEFAULT_CARDS: &[DefaultCard] = &[
    DefaultCard {
        label: "Water",
        image: "/images/water.png",
        phrase: "I want water.",
    },
    DefaultCard {
        label: "Food",
        image: "/images/food.png",
        phrase: "I want food.",
    },
    DefaultCard {
        label: "Toilet",
        image: "/images/toilet.png",
        phrase: "I need the toilet.",
    },
    DefaultCard {
        label: "Break",
        image: "/images/break.png",
        phrase: "I need a break.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn card(label: &str, phrase: &str) -> PecsCard {
        PecsCard {
            id: "c1".into(),
            label: label.into(),
            phrase: phrase.into(),
            image_data: String::new(),
            audio_data: String::new(),
            created_at: 0,
        }
    }

    #[test]
    fn test_spoken_text_falls_back_to_label() {
        assert_eq!(card("Water", "").spoken_text(), "Water");
        assert_eq!(card("Water", "  ").spoken_text(), "Water");
        assert_eq!(card("Water", "I want water.").spoken_text(), "I want water.");
    }

    #[test]
    fn test_card_wire_shape() {
        let json = serde_json::to_value(card("Water", "I want water.")).unwrap();
        assert_eq!(json["imageData"], "");
        assert_eq!(json["audioData"], "");
        assert_eq!(json["createdAt"], 0);
    }

    #[test]
    fn test_default_labels_are_unique() {
        let mut labels: Vec<_> = DEFAULT_CARDS.iter().map(|c| c.label).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), DEFAULT_CARDS.len());
    }
}

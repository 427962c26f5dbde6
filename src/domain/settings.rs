use serde::{Deserialize, Serialize};

pub const DEFAULT_LANG: &str = "en-US";
pub const DEFAULT_VOLUME: f32 = 1.0;

/// Voice and output preferences. Exactly one record exists once saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// BCP 47 locale tag, e.g. `en-US`.
    pub lang: String,
    /// Opaque voice identifier; empty means "auto".
    #[serde(default)]
    pub voice_id: String,
    pub volume: f32,
}

impl Settings {
    pub fn new(lang: impl Into<String>, voice_id: impl Into<String>, volume: f32) -> Self {
        Self {
            lang: lang.into(),
            voice_id: voice_id.into(),
            volume: clamp_volume(volume),
        }
    }

    /// Copy with `volume` clamped into `[0, 1]`.
    pub fn clamped(mut self) -> Self {
        self.volume = clamp_volume(self.volume);
        self
    }

    pub fn uses_auto_voice(&self) -> bool {
        self.voice_id.is_empty()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.to_string(),
            voice_id: String::new(),
            volume: DEFAULT_VOLUME,
        }
    }
}

pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        return DEFAULT_VOLUME;
    }
    volume.clamp(0.0, 1.0)
}

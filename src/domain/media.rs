//! Inline media payloads.
//!
//! Card pictures and recordings are embedded directly in the record as
//! `data:<mime>;base64,<payload>` strings rather than referenced from a
//! separate blob store, so a single card can weigh several megabytes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }

    pub fn parse(input: &str) -> Result<Self, String> {
        let rest = input
            .strip_prefix("data:")
            .ok_or_else(|| "missing data: scheme".to_string())?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| "missing ',' separator".to_string())?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| "only base64 data URIs are supported".to_string())?;
        // Recorders emit parameters such as `audio/webm;codecs=opus`.
        if mime.split(';').next().is_none_or(str::is_empty) {
            return Err("missing media type".to_string());
        }
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| format!("invalid base64 payload: {e}"))?;
        Ok(Self::new(mime, bytes))
    }

    /// Read a picture or recording from disk, guessing its media type from the extension.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let mime = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(mime_for_extension)
            .unwrap_or("application/octet-stream");
        Ok(Self::new(mime, bytes))
    }

    pub fn is_image(&self) -> bool {
        self.mime.starts_with("image/")
    }

    pub fn is_audio(&self) -> bool {
        self.mime.starts_with("audio/")
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "webm" => "audio/webm",
        "ogg" | "oga" => "audio/ogg",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_png() {
        let uri = DataUri::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(uri.mime, "image/png");
        assert_eq!(&uri.bytes[..4], &[0x89, b'P', b'N', b'G']);
        assert!(uri.is_image());
    }

    #[test]
    fn test_parse_recorder_codecs() {
        let uri = DataUri::parse("data:audio/webm;codecs=opus;base64,AAEC").unwrap();
        assert_eq!(uri.mime, "audio/webm;codecs=opus");
        assert!(uri.is_audio());
        assert_eq!(uri.bytes, vec![0, 1, 2]);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(DataUri::parse("/images/water.png").is_err());
        assert!(DataUri::parse("data:image/png,plain").is_err());
        assert!(DataUri::parse("data:;base64,AAEC").is_err());
        assert!(DataUri::parse("data:image/png;base64,@@@").is_err());
    }

    #[test]
    fn test_from_file_guesses_mime() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("water.PNG");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[1, 2, 3]).unwrap();

        let uri = DataUri::from_file(&path).unwrap();
        assert_eq!(uri.mime, "image/png");
        assert_eq!(uri.to_string(), "data:image/png;base64,AQID");
    }
}

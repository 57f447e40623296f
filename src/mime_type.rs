use crate::audio::DEFAULT_EXTENSION;

/// The media type an audio file is served with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MimeType {
    pub essence: &'static str,
    pub extension: &'static str,
}

impl MimeType {
    /// Looks up the media type for a stored file's extension.
    pub fn for_extension(extension: &str) -> Self {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();

        match extension.as_str() {
            "mp3" => MimeType::new("audio/mpeg", "mp3"),
            "wav" => MimeType::new("audio/wav", "wav"),
            "m4a" => MimeType::new("audio/mp4", "m4a"),
            "ogg" => MimeType::new("audio/ogg", "ogg"),
            _ => MimeType::new("application/octet-stream", DEFAULT_EXTENSION),
        }
    }

    fn new(essence: &'static str, extension: &'static str) -> Self {
        Self { essence, extension }
    }
}

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum ProofingError {
    /// The scope key was empty after sanitization.
    #[error("User key must contain at least one letter or number")]
    InvalidScopeKey,

    /// The label is not one of the configured labels.
    #[error("Unknown label {0:?}")]
    UnknownLabel(String),

    /// The uploaded file has an extension that is not accepted.
    #[error("Unsupported audio format {extension:?}")]
    UnsupportedAudioFormat { extension: String },

    /// The audio ID is not in the catalogue.
    #[error("Unknown audio {0}")]
    UnknownAudio(String),

    /// The catalogue entry exists but its stored bytes are gone.
    #[error("Audio {audio_id} is no longer stored; upload it again")]
    ContentUnavailable { audio_id: String, path: PathBuf },

    /// The directory or file could not be written.
    #[error("Storage unavailable at {path}")]
    StorageUnavailable { path: PathBuf, source: io::Error },

    /// The state could not be serialized.
    #[error("Could not serialize state")]
    Serialization { source: serde_json::Error },

    /// A multipart submission could not be read.
    #[error("Malformed form submission")]
    MalformedFormSubmission,

    /// A multipart submission lacked the audio part.
    #[error("Missing parts")]
    PartsMissing,
}

impl ProofingError {
    pub(crate) fn storage(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();

        move |source| ProofingError::StorageUnavailable { path, source }
    }
}

/// Enumerates reasons a duration could not be determined.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The file could not be opened.
    #[error("Could not read audio file")]
    Unreadable(#[from] io::Error),

    /// The WAV header could not be parsed.
    #[error("Malformed WAV file")]
    MalformedWav { source: hound::Error },

    /// The sample rate was zero.
    #[error("Invalid sample rate")]
    InvalidSampleRate,

    /// The container headers could not be parsed.
    #[error("Malformed audio file")]
    MalformedAudio { source: lofty::error::LoftyError },

    /// ffprobe could not be run.
    #[error("ffprobe failed")]
    FfprobeFailed { source: io::Error },

    /// ffprobe produced output that could not be understood.
    #[error("Malformed ffprobe output")]
    MalformedFfprobeOutput { source: serde_json::Error },

    /// No usable duration was reported.
    #[error("No duration reported")]
    MissingDuration,
}

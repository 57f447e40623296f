use std::path::Path;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::errors::ProofingError;

pub mod probe;

/// Identifies one distinct uploaded blob.
pub type AudioId = String;

/// The number of hex digits kept from the digest.
const ID_LENGTH: usize = 16;

/// The extension used when an upload has none.
pub const DEFAULT_EXTENSION: &str = "mp3";

/// The upload extensions accepted, lowercase and without a dot.
pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["mp3", "wav", "m4a", "ogg"];

/// Decides what an audio ID is derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityPolicy {
    /// The filename and the bytes: renaming a file makes a new asset.
    NameAndContent,

    /// Only the bytes.
    ContentOnly,
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        IdentityPolicy::NameAndContent
    }
}

impl FromStr for IdentityPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "name-and-content" => Ok(IdentityPolicy::NameAndContent),
            "content-only" => Ok(IdentityPolicy::ContentOnly),
            other => Err(UnknownPolicy(other.to_owned())),
        }
    }
}

#[derive(Debug)]
pub struct UnknownPolicy(pub String);

/// Derives a short, stable identifier for an upload.
///
/// ```
/// use proofing::audio::{identify, IdentityPolicy};
/// let a = identify("take1.wav", b"RIFF", IdentityPolicy::NameAndContent);
/// let b = identify("take2.wav", b"RIFF", IdentityPolicy::NameAndContent);
/// assert_ne!(a, b);
/// assert_eq!(a.len(), 16);
/// ```
pub fn identify(name: &str, data: &[u8], policy: IdentityPolicy) -> AudioId {
    let mut hasher = Sha256::new();

    if policy == IdentityPolicy::NameAndContent {
        hasher.update(name.as_bytes());
        // separator between name and content
        hasher.update([0u8]);
    }

    hasher.update(data);

    let mut id = format!("{:x}", hasher.finalize());
    id.truncate(ID_LENGTH);
    id
}

/// Returns the lowercase extension to store an upload under, rejecting
/// formats that aren't accepted.
pub fn extension_for(name: &str) -> Result<String, ProofingError> {
    let extension = match Path::new(name).extension() {
        Some(extension) => extension.to_string_lossy().to_lowercase(),
        None => return Ok(DEFAULT_EXTENSION.to_owned()),
    };

    if ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(ProofingError::UnsupportedAudioFormat { extension })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_uploads_share_an_id() {
        let first = identify("a.mp3", b"bytes", IdentityPolicy::NameAndContent);
        let second = identify("a.mp3", b"bytes", IdentityPolicy::NameAndContent);

        assert_eq!(first, second);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn name_is_part_of_identity_by_default() {
        let original = identify("a.mp3", b"bytes", IdentityPolicy::NameAndContent);
        let renamed = identify("b.mp3", b"bytes", IdentityPolicy::NameAndContent);
        let edited = identify("a.mp3", b"bytez", IdentityPolicy::NameAndContent);

        assert_ne!(original, renamed);
        assert_ne!(original, edited);
    }

    #[test]
    fn separator_keeps_name_and_content_apart() {
        let one = identify("ab", b"c", IdentityPolicy::NameAndContent);
        let two = identify("a", b"bc", IdentityPolicy::NameAndContent);

        assert_ne!(one, two);
    }

    #[test]
    fn content_only_ignores_the_name() {
        let original = identify("a.mp3", b"bytes", IdentityPolicy::ContentOnly);
        let renamed = identify("b.mp3", b"bytes", IdentityPolicy::ContentOnly);

        assert_eq!(original, renamed);
    }

    #[test]
    fn policies_parse_from_configuration() {
        assert_eq!("content-only".parse::<IdentityPolicy>().unwrap(), IdentityPolicy::ContentOnly);
        assert_eq!(
            " name-and-content ".parse::<IdentityPolicy>().unwrap(),
            IdentityPolicy::NameAndContent
        );
        assert!("bytes".parse::<IdentityPolicy>().is_err());
    }

    #[test]
    fn extensions_are_lowercased_and_checked() {
        assert_eq!(extension_for("Take.WAV").unwrap(), "wav");
        assert_eq!(extension_for("voice memo").unwrap(), DEFAULT_EXTENSION);
        assert!(matches!(
            extension_for("notes.txt"),
            Err(ProofingError::UnsupportedAudioFormat { .. })
        ));
    }
}

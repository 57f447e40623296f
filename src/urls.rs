use url::Url;

use crate::audio::AudioId;
use crate::identity::ScopeKey;

/// The path segment under which every scope lives.
pub const SCOPE_PATH: &str = "s";

/// Convenience wrapper for URL generation functions.
#[derive(Clone, Debug)]
pub struct Urls {
    /// Top-level URL, including trailing slash.
    base: Url,

    /// Path for all scope-related actions.
    pub(crate) scope_path: String,
}

impl Urls {
    /// Create a new instance. A trailing slash is added to `base` if missing.
    pub fn new(base: impl AsRef<str>) -> Self {
        let raw = base.as_ref();
        let with_slash = if raw.ends_with('/') {
            raw.to_owned()
        } else {
            format!("{}/", raw)
        };
        let base = Url::parse(&with_slash).unwrap_or_else(|_| panic!("parse {} as URL", raw));

        Urls {
            base,
            scope_path: SCOPE_PATH.to_owned(),
        }
    }

    /// The bookmarkable URL of a scope.
    pub fn scope(&self, key: &ScopeKey) -> Url {
        self.base
            .join(&format!("{}/{}/", self.scope_path, key))
            .unwrap_or_else(|_| panic!("get URL for scope {}", key))
    }

    pub fn audio(&self, key: &ScopeKey, audio_id: &AudioId) -> Url {
        self.scope(key)
            .join(&format!("audio/{}", audio_id))
            .unwrap_or_else(|_| panic!("get URL for audio {}", audio_id))
    }

    pub fn export(&self, key: &ScopeKey) -> Url {
        self.scope(key).join("export.csv").expect("get export URL")
    }
}

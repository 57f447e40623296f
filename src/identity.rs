//! Derivation of the user-scoping key.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::errors::ProofingError;

/// The longest key accepted, in characters.
pub const MAX_KEY_LENGTH: usize = 64;

/// A sanitized key partitioning durable state and audio storage.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScopeKey(String);

impl ScopeKey {
    /// Keeps only ASCII letters, digits, `-` and `_`, truncated to
    /// [`MAX_KEY_LENGTH`] characters.
    ///
    /// ```
    /// use proofing::identity::ScopeKey;
    /// assert_eq!(ScopeKey::sanitize(" dw 25!dec ").unwrap().as_str(), "dw25dec");
    /// assert!(ScopeKey::sanitize("!!!").is_err());
    /// ```
    pub fn sanitize(raw: impl AsRef<str>) -> Result<Self, ProofingError> {
        let key = raw
            .as_ref()
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .take(MAX_KEY_LENGTH)
            .collect::<String>();

        if key.is_empty() {
            return Err(ProofingError::InvalidScopeKey);
        }

        Ok(ScopeKey(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ScopeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for ScopeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// The key entry gate. A session starts without a key and becomes
/// scoped once a valid key has been submitted; there is no way back.
#[derive(Clone, Debug, PartialEq)]
pub enum Gate {
    NoKey { error: Option<String> },
    Scoped(ScopeKey),
}

impl Default for Gate {
    fn default() -> Self {
        Gate::NoKey { error: None }
    }
}

impl Gate {
    /// Starts from whatever key the addressable location already carries.
    pub fn from_location(raw: Option<&str>) -> Self {
        match raw.map(ScopeKey::sanitize) {
            Some(Ok(key)) => Gate::Scoped(key),
            _ => Gate::default(),
        }
    }

    /// Applies a submitted raw key.
    pub fn submit(self, raw: &str) -> Self {
        match self {
            Gate::Scoped(key) => Gate::Scoped(key),
            Gate::NoKey { .. } => match ScopeKey::sanitize(raw) {
                Ok(key) => Gate::Scoped(key),
                Err(e) => Gate::NoKey {
                    error: Some(e.to_string()),
                },
            },
        }
    }

    pub fn key(&self) -> Option<&ScopeKey> {
        match self {
            Gate::Scoped(key) => Some(key),
            Gate::NoKey { .. } => None,
        }
    }
}

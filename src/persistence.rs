use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, warn, Logger};
use tempfile::NamedTempFile;

use crate::errors::ProofingError;
use crate::identity::ScopeKey;
use crate::state::UserState;

/// The name of the state file inside each scope directory.
pub const STATE_FILE_NAME: &str = "state.json";

/// The name of the audio directory inside each scope directory.
pub const AUDIO_DIR_NAME: &str = "audio";

/// Loads and saves the state of each scope under a data root:
/// `<root>/<key>/state.json`, with audio in `<root>/<key>/audio/`.
pub struct Gateway {
    root: PathBuf,
    logger: Arc<Logger>,
}

impl Gateway {
    pub fn new(root: impl Into<PathBuf>, logger: Arc<Logger>) -> Self {
        Gateway {
            root: root.into(),
            logger,
        }
    }

    pub fn scope_dir(&self, key: &ScopeKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    pub fn state_path(&self, key: &ScopeKey) -> PathBuf {
        self.scope_dir(key).join(STATE_FILE_NAME)
    }

    pub fn audio_dir(&self, key: &ScopeKey) -> PathBuf {
        self.scope_dir(key).join(AUDIO_DIR_NAME)
    }

    /// Reads the state of `key`. A missing, unreadable or corrupt file
    /// yields a fresh state.
    pub fn load(&self, key: &ScopeKey) -> UserState {
        let path = self.state_path(key);

        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(self.logger, "No saved state"; "scope" => %key);
                return UserState::new();
            }
            Err(e) => {
                warn!(self.logger, "Could not read saved state, starting afresh"; "scope" => %key, "path" => %path.display(), "error" => %e);
                return UserState::new();
            }
        };

        match serde_json::from_slice::<UserState>(&raw) {
            Ok(mut state) => {
                state.migrate();
                state
            }
            Err(e) => {
                warn!(self.logger, "Saved state is corrupt, starting afresh"; "scope" => %key, "path" => %path.display(), "error" => %e);
                UserState::new()
            }
        }
    }

    /// Writes the state of `key` to a temporary file beside the target
    /// and renames it into place, so readers never see a partial file.
    pub fn save(&self, key: &ScopeKey, state: &UserState) -> Result<(), ProofingError> {
        let dir = self.scope_dir(key);
        let path = self.state_path(key);

        let serialized = serde_json::to_vec_pretty(state)
            .map_err(|source| ProofingError::Serialization { source })?;

        fs::create_dir_all(&dir).map_err(ProofingError::storage(&dir))?;

        let mut temp = NamedTempFile::new_in(&dir).map_err(ProofingError::storage(&dir))?;
        temp.write_all(&serialized)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(ProofingError::storage(temp.path()))?;
        temp.persist(&path)
            .map_err(|e| ProofingError::storage(&path)(e.error))?;

        debug!(self.logger, "Saved state"; "scope" => %key, "events" => state.events.len(), "assets" => state.catalogue.len());

        Ok(())
    }
}

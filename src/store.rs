use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::audio::{self, AudioId, IdentityPolicy};
use crate::errors::ProofingError;

#[cfg(test)]
pub(crate) mod mock;

pub trait Store {
    /// Returns where the object with the given ID and extension lives.
    fn path_for(&self, id: &AudioId, extension: &str) -> PathBuf;

    /// Saves the given data under the given ID, unless an object is
    /// already there, and returns its location.
    fn save(&self, id: &AudioId, extension: &str, raw: &[u8]) -> Result<PathBuf, ProofingError>;

    /// Returns whether an object is still present at `path`.
    fn contains(&self, path: &Path) -> bool;
}

/// An upload after it has been placed in a store.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredAudio {
    pub name: String,
    pub path: PathBuf,
    pub id: AudioId,
}

/// Identifies an upload and places its bytes in `store`. Repeating the
/// same upload returns the same location without writing again.
pub fn store_upload(
    store: &(impl Store + ?Sized),
    name: &str,
    raw: &[u8],
    policy: IdentityPolicy,
) -> Result<StoredAudio, ProofingError> {
    let extension = audio::extension_for(name)?;
    let id = audio::identify(name, raw, policy);
    let path = store.save(&id, &extension, raw)?;

    Ok(StoredAudio {
        name: name.to_owned(),
        path,
        id,
    })
}

/// A store that keeps one file per audio ID in a directory.
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    /// Creates a new instance. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FsStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Store for FsStore {
    fn path_for(&self, id: &AudioId, extension: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", id, extension))
    }

    fn save(&self, id: &AudioId, extension: &str, raw: &[u8]) -> Result<PathBuf, ProofingError> {
        let path = self.path_for(id, extension);

        if path.is_file() {
            return Ok(path);
        }

        fs::create_dir_all(&self.dir).map_err(ProofingError::storage(&self.dir))?;

        let mut temp = NamedTempFile::new_in(&self.dir).map_err(ProofingError::storage(&self.dir))?;
        temp.write_all(raw).map_err(ProofingError::storage(temp.path()))?;
        temp.persist(&path)
            .map_err(|e| ProofingError::storage(&path)(e.error))?;

        Ok(path)
    }

    fn contains(&self, path: &Path) -> bool {
        path.is_file()
    }
}

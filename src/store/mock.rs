use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::audio::AudioId;
use crate::errors::ProofingError;
use crate::store::Store;

/// An in-memory store that records every write.
#[derive(Default)]
pub(crate) struct MockStore {
    pub(crate) map: RwLock<HashMap<PathBuf, Vec<u8>>>,
    pub(crate) writes: RwLock<usize>,
    unavailable: bool,
}

impl MockStore {
    pub fn new() -> Self {
        Default::default()
    }

    /// A store whose every save fails.
    pub fn unavailable() -> Self {
        MockStore {
            unavailable: true,
            ..Default::default()
        }
    }
}

impl Store for MockStore {
    fn path_for(&self, id: &AudioId, extension: &str) -> PathBuf {
        PathBuf::from("/mock").join(format!("{}.{}", id, extension))
    }

    fn save(&self, id: &AudioId, extension: &str, raw: &[u8]) -> Result<PathBuf, ProofingError> {
        let path = self.path_for(id, extension);

        if self.unavailable {
            return Err(ProofingError::StorageUnavailable {
                path,
                source: io::Error::new(io::ErrorKind::PermissionDenied, "mock store is unavailable"),
            });
        }

        let mut map = self.map.write().unwrap();

        if !map.contains_key(&path) {
            map.insert(path.clone(), raw.to_vec());
            *self.writes.write().unwrap() += 1;
        }

        Ok(path)
    }

    fn contains(&self, path: &Path) -> bool {
        self.map.read().unwrap().contains_key(path)
    }
}

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::audio::AudioId;
use crate::timecode;

/// One distinct uploaded audio file.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct AudioAsset {
    /// The filename as uploaded.
    pub name: String,

    /// Where the bytes are stored.
    pub path: PathBuf,

    /// The playable length, if it could be determined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<f64>,
}

/// A catalogue entry as offered in the picker.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Listing {
    pub audio_id: AudioId,
    pub label: String,
}

/// The outcome of choosing which asset is active.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// Nothing has been uploaded yet.
    Empty,

    /// The asset can be played.
    Ready(AudioId),

    /// The asset is registered but its bytes are gone.
    Unavailable(AudioId),
}

/// The uploaded audio files of one scope, keyed by ID.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Catalogue(BTreeMap<AudioId, AudioAsset>);

impl Catalogue {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get(&self, audio_id: &str) -> Option<&AudioAsset> {
        self.0.get(audio_id)
    }

    /// The asset with the map's own copy of its ID.
    pub fn entry(&self, audio_id: &str) -> Option<(&AudioId, &AudioAsset)> {
        self.0.get_key_value(audio_id)
    }

    pub(crate) fn get_mut(&mut self, audio_id: &str) -> Option<&mut AudioAsset> {
        self.0.get_mut(audio_id)
    }

    pub fn contains(&self, audio_id: &str) -> bool {
        self.0.contains_key(audio_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Inserts or overwrites an asset. A known duration is never
    /// replaced by an unknown one. Returns whether the ID was new.
    pub fn register(&mut self, audio_id: AudioId, mut asset: AudioAsset) -> bool {
        match self.0.get(&audio_id) {
            Some(existing) => {
                if asset.duration_sec.is_none() {
                    asset.duration_sec = existing.duration_sec;
                }

                self.0.insert(audio_id, asset);
                false
            }
            None => {
                self.0.insert(audio_id, asset);
                true
            }
        }
    }

    /// Lists the assets ordered by name, ignoring case.
    pub fn list(&self, precision: usize) -> Vec<Listing> {
        let mut entries = self.0.iter().collect::<Vec<_>>();
        entries.sort_by(|(a_id, a), (b_id, b)| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a_id.cmp(b_id))
        });

        entries
            .into_iter()
            .map(|(audio_id, asset)| Listing {
                audio_id: audio_id.clone(),
                label: match asset.duration_sec {
                    Some(duration) => {
                        format!("{} ({})", asset.name, timecode::format(duration, precision))
                    }
                    None => asset.name.clone(),
                },
            })
            .collect()
    }

    /// Chooses the active asset: the requested one if it is registered,
    /// else the last active one, else the first listed. The entry is kept
    /// even when its bytes have gone missing.
    pub fn resolve_active(
        &self,
        requested: Option<&str>,
        last_active: Option<&str>,
        exists: impl Fn(&Path) -> bool,
    ) -> Resolution {
        let chosen = requested
            .filter(|id| self.contains(id))
            .or_else(|| last_active.filter(|id| self.contains(id)))
            .map(str::to_owned)
            .or_else(|| self.list(0).into_iter().next().map(|l| l.audio_id));

        match chosen {
            None => Resolution::Empty,
            Some(audio_id) => match self.0.get(&audio_id) {
                Some(asset) if exists(&asset.path) => Resolution::Ready(audio_id),
                _ => Resolution::Unavailable(audio_id),
            },
        }
    }
}

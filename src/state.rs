use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::audio::AudioId;
use crate::catalogue::{AudioAsset, Catalogue};
use crate::event::EventLog;
use crate::resume::ResumeTracker;

/// Everything persisted for one scope key.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct UserState {
    /// The logged events, in logging order.
    #[serde(default)]
    pub events: EventLog,

    /// The uploaded audio files.
    #[serde(default, rename = "audio_files")]
    pub catalogue: Catalogue,

    /// The asset most recently uploaded or selected.
    #[serde(default)]
    pub last_audio_id: Option<AudioId>,

    /// Playback positions and mount requests.
    #[serde(flatten)]
    pub resume: ResumeTracker,

    /// Durations kept outside the catalogue by older versions.
    #[serde(default, skip_serializing)]
    duration_by_audio: BTreeMap<AudioId, f64>,

    /// One-shot jumps written by older versions.
    #[serde(default, skip_serializing)]
    pending_start_by_audio: BTreeMap<AudioId, f64>,

    /// Fields this version doesn't know about, written back unchanged.
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl UserState {
    pub fn new() -> Self {
        Default::default()
    }

    /// The last active asset, if it is still registered.
    pub fn active_asset(&self) -> Option<(&AudioId, &AudioAsset)> {
        self.catalogue.entry(self.last_audio_id.as_ref()?)
    }

    /// Brings state written by older versions up to date.
    pub(crate) fn migrate(&mut self) {
        for (audio_id, duration) in std::mem::take(&mut self.duration_by_audio) {
            if let Some(asset) = self.catalogue.get_mut(&audio_id) {
                if asset.duration_sec.is_none() && duration.is_finite() {
                    asset.duration_sec = Some(duration);
                }
            }
        }

        for (audio_id, start) in std::mem::take(&mut self.pending_start_by_audio) {
            self.resume.request_start(&audio_id, start);
        }

        self.events.rederive();
    }
}

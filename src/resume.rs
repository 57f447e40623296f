//! Last known playback positions and player remount requests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::audio::AudioId;

/// What the player should be mounted with. A new `version` tells the
/// widget to reinitialise rather than keep a stale instance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlayerMount {
    pub start_at: f64,
    pub version: u64,
}

/// Per-audio positions, persisted as three flat maps.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ResumeTracker {
    /// The most recently reported position of each audio.
    #[serde(default)]
    pub(crate) last_time_by_audio: BTreeMap<AudioId, f64>,

    /// The start position requested for the next mount.
    #[serde(default)]
    pub(crate) player_start_by_audio: BTreeMap<AudioId, f64>,

    /// The mount version of each audio.
    #[serde(default)]
    pub(crate) player_nonce_by_audio: BTreeMap<AudioId, u64>,
}

impl ResumeTracker {
    /// Records a reported position. The most recent report wins; negative
    /// positions are clamped to zero and non-finite ones ignored.
    /// Returns whether anything was recorded.
    pub fn report(&mut self, audio_id: &str, seconds: f64) -> bool {
        if !seconds.is_finite() {
            return false;
        }

        self.last_time_by_audio
            .insert(audio_id.to_owned(), seconds.max(0.0));

        true
    }

    /// The last known position, or zero.
    pub fn last_played(&self, audio_id: &str) -> f64 {
        self.last_time_by_audio.get(audio_id).copied().unwrap_or(0.0)
    }

    /// The current mount parameters for the player of `audio_id`.
    pub fn mount(&self, audio_id: &str) -> PlayerMount {
        PlayerMount {
            start_at: self
                .player_start_by_audio
                .get(audio_id)
                .copied()
                .unwrap_or(0.0),
            version: self
                .player_nonce_by_audio
                .get(audio_id)
                .copied()
                .unwrap_or(0),
        }
    }

    /// Requests that the player start at `seconds` on its next mount. The
    /// version always advances, even if the position is unchanged.
    pub fn request_start(&mut self, audio_id: &str, seconds: f64) -> PlayerMount {
        let start_at = if seconds.is_finite() {
            seconds.max(0.0)
        } else {
            0.0
        };
        let version = self.mount(audio_id).version + 1;

        self.player_start_by_audio
            .insert(audio_id.to_owned(), start_at);
        self.player_nonce_by_audio
            .insert(audio_id.to_owned(), version);

        PlayerMount { start_at, version }
    }
}

//! What a client needs to render a scope.

use std::path::Path;

use serde::Serialize;
use url::Url;

use crate::audio::AudioId;
use crate::catalogue::{Listing, Resolution};
use crate::event::Event;
use crate::identity::ScopeKey;
use crate::resume::PlayerMount;
use crate::state::UserState;
use crate::timecode;
use crate::urls::Urls;

#[derive(Debug, Serialize)]
pub struct View<'a> {
    pub key: &'a ScopeKey,
    pub url: Url,
    pub labels: &'a [String],
    pub events: &'a [Event],
    pub assets: Vec<Listing>,
    pub active: Option<ActiveView<'a>>,
    pub export_url: Url,
}

/// The asset the player is mounted with.
#[derive(Debug, Serialize)]
pub struct ActiveView<'a> {
    pub audio_id: &'a AudioId,
    pub name: &'a str,
    /// False when the stored bytes have gone missing.
    pub available: bool,
    pub duration_sec: Option<f64>,
    pub duration: Option<String>,
    pub last_played: f64,
    pub last_played_timecode: String,
    pub mount: PlayerMount,
    pub audio_url: Option<Url>,
}

impl<'a> View<'a> {
    pub fn new(
        key: &'a ScopeKey,
        state: &'a UserState,
        labels: &'a [String],
        precision: usize,
        urls: &Urls,
        exists: impl Fn(&Path) -> bool,
    ) -> Self {
        let (audio_id, available) =
            match state
                .catalogue
                .resolve_active(None, state.last_audio_id.as_deref(), exists)
            {
                Resolution::Empty => (None, false),
                Resolution::Ready(audio_id) => (Some(audio_id), true),
                Resolution::Unavailable(audio_id) => (Some(audio_id), false),
            };

        let active = audio_id.and_then(|audio_id| {
            let (audio_id, asset) = state.catalogue.entry(&audio_id)?;
            let last_played = state.resume.last_played(audio_id);

            Some(ActiveView {
                audio_id,
                name: &asset.name,
                available,
                duration_sec: asset.duration_sec,
                duration: asset
                    .duration_sec
                    .map(|duration| timecode::format(duration, precision)),
                last_played,
                last_played_timecode: timecode::format(last_played, precision),
                mount: state.resume.mount(audio_id),
                audio_url: if available {
                    Some(urls.audio(key, audio_id))
                } else {
                    None
                },
            })
        });

        View {
            key,
            url: urls.scope(key),
            labels,
            events: state.events.events(),
            assets: state.catalogue.list(precision),
            active,
            export_url: urls.export(key),
        }
    }
}

use std::sync::Arc;

use log::{debug, warn, Logger};

use crate::actions::{self, Action, Outcome, Rules};
use crate::audio::AudioId;
use crate::catalogue::AudioAsset;
use crate::environment::{Config, Probe};
use crate::errors::ProofingError;
use crate::identity::ScopeKey;
use crate::persistence::Gateway;
use crate::state::UserState;
use crate::store::{store_upload, Store};
use crate::urls::Urls;
use crate::view::View;

/// The state of one scope together with everything needed to act on it.
/// A session lives for one request: it loads on open and flushes after
/// each action that changed something.
pub struct Session<S: Store> {
    key: ScopeKey,
    gateway: Arc<Gateway>,
    store: S,
    prober: Arc<Probe>,
    config: Arc<Config>,
    logger: Logger,
    state: UserState,
}

impl<S: Store> Session<S> {
    pub fn open(
        key: ScopeKey,
        gateway: Arc<Gateway>,
        store: S,
        prober: Arc<Probe>,
        config: Arc<Config>,
        logger: Logger,
    ) -> Self {
        let state = gateway.load(&key);

        Session {
            key,
            gateway,
            store,
            prober,
            config,
            logger,
            state,
        }
    }

    pub fn key(&self) -> &ScopeKey {
        &self.key
    }

    pub fn state(&self) -> &UserState {
        &self.state
    }

    /// Applies `action` and saves if it changed anything.
    pub fn perform(&mut self, action: Action) -> Result<Outcome, ProofingError> {
        let store = &self.store;
        let exists = |path: &std::path::Path| store.contains(path);
        let rules = Rules {
            labels: self.config.labels(),
            precision: self.config.precision(),
            now: now(),
            exists: &exists,
        };

        let outcome = actions::apply(&mut self.state, action, &rules)?;

        if outcome.changed {
            self.gateway.save(&self.key, &self.state)?;
        }

        Ok(outcome)
    }

    /// Stores an upload, looks up its duration if it is new, and makes it
    /// the active asset. The state is reloaded after storing so that
    /// changes saved while the bytes were being written are kept.
    pub fn upload(&mut self, name: &str, raw: &[u8]) -> Result<Outcome, ProofingError> {
        let stored = store_upload(&self.store, name, raw, self.config.policy())?;
        debug!(self.logger, "Stored upload"; "audio_id" => &stored.id, "path" => %stored.path.display());

        self.state = self.gateway.load(&self.key);

        let duration_sec = if self.state.catalogue.contains(&stored.id) {
            None
        } else {
            match self.prober.probe(&stored.path) {
                Ok(duration) => Some(duration),
                Err(e) => {
                    debug!(self.logger, "Could not determine duration"; "audio_id" => &stored.id, "error" => %e);
                    None
                }
            }
        };

        self.perform(Action::Register {
            stored,
            duration_sec,
        })
    }

    pub fn view(&self, urls: &Urls) -> View {
        View::new(
            &self.key,
            &self.state,
            self.config.labels(),
            self.config.precision(),
            urls,
            |path| self.store.contains(path),
        )
    }

    /// The event log as CSV.
    pub fn export_csv(&self) -> Vec<u8> {
        self.state.events.to_csv_bytes()
    }

    /// The asset to play back, if its bytes are still stored.
    pub fn audio(&self, audio_id: &AudioId) -> Result<&AudioAsset, ProofingError> {
        let asset = self
            .state
            .catalogue
            .get(audio_id)
            .ok_or_else(|| ProofingError::UnknownAudio(audio_id.clone()))?;

        if !self.store.contains(&asset.path) {
            warn!(self.logger, "Stored audio has gone missing"; "audio_id" => audio_id, "path" => %asset.path.display());

            return Err(ProofingError::ContentUnavailable {
                audio_id: audio_id.clone(),
                path: asset.path.clone(),
            });
        }

        Ok(asset)
    }
}

fn now() -> f64 {
    time::OffsetDateTime::now_utc().unix_timestamp_nanos() as f64 / 1e9
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;
    use crate::actions::{Command, JumpTarget};
    use crate::audio::probe::DurationProbe;
    use crate::errors::ProbeError;
    use crate::store::mock::MockStore;
    use crate::store::FsStore;

    struct FixedProbe(Option<f64>);

    impl DurationProbe for FixedProbe {
        fn probe(&self, _path: &Path) -> Result<f64, ProbeError> {
            self.0.ok_or(ProbeError::MissingDuration)
        }
    }

    fn key() -> ScopeKey {
        ScopeKey::sanitize("session").expect("sanitize key")
    }

    fn gateway(dir: &TempDir) -> Arc<Gateway> {
        Arc::new(Gateway::new(dir.path(), Arc::new(log::silent_logger())))
    }

    fn open<S: Store>(dir: &TempDir, store: S, duration: Option<f64>) -> Session<S> {
        Session::open(
            key(),
            gateway(dir),
            store,
            Arc::new(FixedProbe(duration)),
            Arc::new(Config::default()),
            log::silent_logger(),
        )
    }

    fn fs_session(dir: &TempDir) -> Session<FsStore> {
        let store = FsStore::new(gateway(dir).audio_dir(&key()));

        open(dir, store, Some(95.25))
    }

    #[test]
    fn upload_registers_and_persists() {
        let dir = TempDir::new().expect("create temporary directory");
        let mut session = fs_session(&dir);

        let outcome = session.upload("Take 1.wav", b"RIFF bytes").expect("upload");
        let (audio_id, asset) = session.state().active_asset().expect("active asset");

        assert!(matches!(outcome.commands[0], Command::MountPlayer { version: 0, .. }));
        assert_eq!(asset.name, "Take 1.wav");
        assert_eq!(asset.duration_sec, Some(95.25));
        assert!(asset.path.starts_with(dir.path().join("session").join("audio")));

        let audio_id = audio_id.clone();
        let reopened = fs_session(&dir);
        assert_eq!(reopened.state(), session.state());
        assert!(reopened.audio(&audio_id).is_ok());
    }

    #[test]
    fn reupload_is_not_probed_again() {
        let dir = TempDir::new().expect("create temporary directory");
        let mut session = open(&dir, MockStore::new(), Some(10.0));
        session.upload("a.mp3", b"bytes").expect("first upload");

        let mut session = open(&dir, MockStore::new(), None);
        session.upload("a.mp3", b"bytes").expect("second upload");
        session.upload("a.mp3", b"bytes").expect("third upload");

        let (_, asset) = session.state().active_asset().expect("active asset");
        assert_eq!(asset.duration_sec, Some(10.0));
        assert_eq!(*session.store.writes.read().unwrap(), 1);
    }

    #[test]
    fn upload_keeps_changes_saved_while_it_ran() {
        let dir = TempDir::new().expect("create temporary directory");
        let mut uploader = open(&dir, MockStore::new(), Some(60.0));
        uploader.upload("take.wav", b"bytes").expect("first upload");
        let audio_id = uploader.state().last_audio_id.clone().expect("active asset");

        let mut player = open(&dir, MockStore::new(), None);
        player
            .perform(Action::ReportPosition {
                audio_id: audio_id.clone(),
                position: Some(42.0),
            })
            .expect("report position");

        uploader.upload("take.wav", b"bytes").expect("second upload");

        assert_eq!(uploader.state().resume.last_played(&audio_id), 42.0);
        assert_eq!(
            open(&dir, MockStore::new(), None).state().resume.last_played(&audio_id),
            42.0
        );
    }

    #[test]
    fn probe_failure_leaves_duration_unknown() {
        let dir = TempDir::new().expect("create temporary directory");
        let mut session = open(&dir, MockStore::new(), None);

        session.upload("a.ogg", b"bytes").expect("upload");

        let (_, asset) = session.state().active_asset().expect("active asset");
        assert_eq!(asset.duration_sec, None);
    }

    #[test]
    fn unavailable_store_changes_nothing() {
        let dir = TempDir::new().expect("create temporary directory");
        let mut session = open(&dir, MockStore::unavailable(), None);

        let result = session.upload("a.mp3", b"bytes");

        assert!(matches!(result, Err(ProofingError::StorageUnavailable { .. })));
        assert!(session.state().catalogue.is_empty());
        assert!(!gateway(&dir).state_path(&key()).exists());
    }

    #[test]
    fn unchanged_outcomes_are_not_saved() {
        let dir = TempDir::new().expect("create temporary directory");
        let mut session = open(&dir, MockStore::new(), None);

        session.perform(Action::Undo).expect("undo nothing");
        assert!(!gateway(&dir).state_path(&key()).exists());

        session.perform(Action::ForceSave).expect("force save");
        assert!(gateway(&dir).state_path(&key()).exists());
    }

    #[test]
    fn logged_event_is_exported() {
        let dir = TempDir::new().expect("create temporary directory");
        let mut session = open(&dir, MockStore::new(), None);
        session.upload("take.wav", b"bytes").expect("upload");
        let audio_id = session.state().last_audio_id.clone().expect("active asset");

        session
            .perform(Action::ReportPosition {
                audio_id,
                position: Some(12.5),
            })
            .expect("report position");
        session
            .perform(Action::LogEvent {
                label: "Pop".to_owned(),
                note: String::new(),
                position: None,
            })
            .expect("log event");

        let csv = String::from_utf8(open(&dir, MockStore::new(), None).export_csv()).expect("decode CSV");
        let mut lines = csv.lines();

        assert_eq!(lines.next(), Some("audio_file,time_sec,timecode,label,note,logged_at_epoch"));
        assert!(lines
            .next()
            .expect("one row")
            .starts_with("take.wav,12.5,00:00:12.50,Pop,,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn vanished_audio_is_unavailable_but_kept() {
        let dir = TempDir::new().expect("create temporary directory");
        let mut session = fs_session(&dir);
        session.upload("take.mp3", b"bytes").expect("upload");
        let (audio_id, asset) = session.state().active_asset().expect("active asset");
        let (audio_id, path) = (audio_id.clone(), asset.path.clone());

        fs::remove_file(&path).expect("delete audio out of band");

        let mut session = fs_session(&dir);
        assert!(matches!(
            session.audio(&audio_id),
            Err(ProofingError::ContentUnavailable { .. })
        ));

        let view = session.view(&Urls::new("http://localhost/"));
        let active = view.active.expect("active view");
        assert!(!active.available);
        assert_eq!(active.audio_url, None);

        let outcome = session
            .perform(Action::SelectAsset {
                audio_id: audio_id.clone(),
            })
            .expect("select asset");
        assert!(matches!(outcome.commands[0], Command::Warn { .. }));
        assert!(session.state().catalogue.contains(&audio_id));

        assert!(matches!(
            session.audio(&"ffffffffffffffff".to_owned()),
            Err(ProofingError::UnknownAudio(_))
        ));
    }

    #[test]
    fn view_reflects_resume_and_mount() {
        let dir = TempDir::new().expect("create temporary directory");
        let mut session = fs_session(&dir);
        session.upload("take.wav", b"bytes").expect("upload");
        let audio_id = session.state().last_audio_id.clone().expect("active asset");

        session
            .perform(Action::ReportPosition {
                audio_id: audio_id.clone(),
                position: Some(70.0),
            })
            .expect("report position");
        session
            .perform(Action::Jump {
                audio_id: audio_id.clone(),
                target: JumpTarget::LastPlayed,
            })
            .expect("jump");

        let urls = Urls::new("http://localhost/");
        let view = session.view(&urls);
        let active = view.active.expect("active view");

        assert_eq!(active.last_played_timecode, "00:01:10.00");
        assert_eq!(active.mount.start_at, 70.0);
        assert_eq!(active.mount.version, 1);
        assert_eq!(active.duration.as_deref(), Some("00:01:35.25"));
        assert_eq!(
            active.audio_url,
            Some(urls.audio(&key(), &audio_id))
        );
        assert_eq!(view.assets[0].label, "take.wav (00:01:35.25)");
    }
}

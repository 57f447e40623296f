use std::path::PathBuf;
use std::sync::Arc;

use log::Logger;

use crate::audio::probe::DurationProbe;
use crate::audio::IdentityPolicy;
use crate::config::{get_variable_or, parse_labels};
use crate::identity::ScopeKey;
use crate::persistence::Gateway;
use crate::session::Session;
use crate::store::FsStore;
use crate::timecode::{DEFAULT_PRECISION, MAX_PRECISION};
use crate::urls::Urls;

pub type Probe = dyn DurationProbe + Send + Sync;

/// The labels offered when none are configured.
pub const DEFAULT_LABELS: &str = "Breath,Pop,Noise,Click,Plosive,Mouth,Other";

#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub gateway: Arc<Gateway>,
    pub urls: Arc<Urls>,
    pub prober: Arc<Probe>,
    pub config: Arc<Config>,
}

impl Environment {
    pub fn new(
        logger: Arc<Logger>,
        gateway: Arc<Gateway>,
        urls: Arc<Urls>,
        prober: Arc<Probe>,
        config: Config,
    ) -> Self {
        Self {
            logger,
            gateway,
            urls,
            prober,
            config: Arc::new(config),
        }
    }

    /// Loads the state of `key` and wraps it with this environment's
    /// collaborators.
    pub fn session(&self, key: ScopeKey) -> Session<FsStore> {
        let store = FsStore::new(self.gateway.audio_dir(&key));
        let logger = self.logger.new(log::o!("scope" => key.to_string()));

        Session::open(
            key,
            self.gateway.clone(),
            store,
            self.prober.clone(),
            self.config.clone(),
            logger,
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Where per-scope state and audio are kept.
    pub(crate) data_root: PathBuf,

    /// The labels that can be logged by a click.
    pub(crate) labels: Vec<String>,

    /// Fractional digits in rendered timecodes.
    pub(crate) precision: usize,

    /// What audio IDs are derived from.
    pub(crate) policy: IdentityPolicy,
}

impl Config {
    pub fn new(
        data_root: impl Into<PathBuf>,
        labels: Vec<String>,
        precision: usize,
        policy: IdentityPolicy,
    ) -> Self {
        Self {
            data_root: data_root.into(),
            labels,
            precision: precision.min(MAX_PRECISION),
            policy,
        }
    }

    /// Reads the optional settings from the environment, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let labels = parse_labels(&get_variable_or("PROOFING_LABELS", DEFAULT_LABELS));
        let precision = get_variable_or("PROOFING_TIMECODE_PRECISION", &DEFAULT_PRECISION.to_string())
            .parse()
            .expect("parse PROOFING_TIMECODE_PRECISION as usize");
        let policy = get_variable_or("PROOFING_AUDIO_ID_POLICY", "name-and-content")
            .parse()
            .expect("parse PROOFING_AUDIO_ID_POLICY as name-and-content or content-only");

        assert!(!labels.is_empty(), "PROOFING_LABELS must name at least one label");

        Config::new(
            get_variable_or("PROOFING_DATA_ROOT", "data"),
            labels,
            precision,
            policy,
        )
    }

    pub fn data_root(&self) -> &PathBuf {
        &self.data_root
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn policy(&self) -> IdentityPolicy {
        self.policy
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(
            "data",
            parse_labels(DEFAULT_LABELS),
            DEFAULT_PRECISION,
            IdentityPolicy::default(),
        )
    }
}

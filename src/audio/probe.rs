use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use lazy_static::lazy_static;
use lofty::file::AudioFile;
use lofty::probe::Probe;
use serde::Deserialize;

use crate::errors::ProbeError;

lazy_static! {
    static ref FFPROBE_ARGS: Vec<OsString> = vec![
        OsString::from("-hide_banner"),
        OsString::from("-v"),
        OsString::from("error"),
        OsString::from("-of"),
        OsString::from("json"),
        OsString::from("-show_format"),
    ];
}

/// Looks up the playable length of a stored audio file. Implementations
/// must only read.
pub trait DurationProbe {
    fn probe(&self, path: &Path) -> Result<f64, ProbeError>;
}

/// Reads the duration from a WAV header.
pub struct WavProbe;

impl DurationProbe for WavProbe {
    fn probe(&self, path: &Path) -> Result<f64, ProbeError> {
        let reader = hound::WavReader::open(path).map_err(|e| match e {
            hound::Error::IoError(e) => ProbeError::Unreadable(e),
            source => ProbeError::MalformedWav { source },
        })?;

        let rate = reader.spec().sample_rate;

        if rate == 0 {
            return Err(ProbeError::InvalidSampleRate);
        }

        // `duration` counts frames, not samples
        Ok(f64::from(reader.duration()) / f64::from(rate))
    }
}

/// Asks `ffprobe` for the container duration.
pub struct FfprobeProbe {
    ffprobe: PathBuf,
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

impl FfprobeProbe {
    pub fn new(ffprobe: impl AsRef<Path>) -> Self {
        FfprobeProbe {
            ffprobe: ffprobe.as_ref().to_owned(),
        }
    }
}

impl DurationProbe for FfprobeProbe {
    fn probe(&self, path: &Path) -> Result<f64, ProbeError> {
        if !path.is_file() {
            return Err(ProbeError::Unreadable(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }

        let output = Command::new(&self.ffprobe)
            .args(&[FFPROBE_ARGS.clone(), vec![OsString::from(path)]].concat())
            .output()
            .map_err(|source| ProbeError::FfprobeFailed { source })?;

        let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|source| ProbeError::MalformedFfprobeOutput { source })?;

        parsed
            .format
            .duration
            .and_then(|d| d.trim().parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0)
            .ok_or(ProbeError::MissingDuration)
    }
}

/// Reads the duration from the container headers of any format lofty
/// understands (MP3, MP4/M4A, Ogg, FLAC and others).
pub struct LoftyProbe;

impl DurationProbe for LoftyProbe {
    fn probe(&self, path: &Path) -> Result<f64, ProbeError> {
        let tagged_file = Probe::open(path)
            .and_then(|probe| probe.read())
            .map_err(|source| ProbeError::MalformedAudio { source })?;

        let seconds = tagged_file.properties().duration().as_secs_f64();

        // lofty reports zero when the headers carry no length
        if seconds > 0.0 {
            Ok(seconds)
        } else {
            Err(ProbeError::MissingDuration)
        }
    }
}

/// Dispatches on the file extension: WAV headers are read with hound,
/// everything else (and any WAV hound rejects) goes through lofty, and
/// `ffprobe` is the last resort if it is installed.
pub struct Prober {
    wav: WavProbe,
    generic: LoftyProbe,
    fallback: Option<FfprobeProbe>,
}

impl Prober {
    pub fn new(ffprobe_path: Option<PathBuf>) -> Self {
        Prober {
            wav: WavProbe,
            generic: LoftyProbe,
            fallback: ffprobe_path.map(FfprobeProbe::new),
        }
    }
}

impl DurationProbe for Prober {
    fn probe(&self, path: &Path) -> Result<f64, ProbeError> {
        let is_wav = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);

        let in_process = if is_wav {
            self.wav.probe(path).or_else(|_| self.generic.probe(path))
        } else {
            self.generic.probe(path)
        };

        match (in_process, &self.fallback) {
            (Ok(seconds), _) => Ok(seconds),
            (Err(e), None) => Err(e),
            (Err(_), Some(fallback)) => fallback.probe(path),
        }
    }
}

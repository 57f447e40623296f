//! The actions a user can take, each applied to an explicit [`UserState`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audio::AudioId;
use crate::catalogue::{AudioAsset, Resolution};
use crate::errors::ProofingError;
use crate::event::{EditedRow, Event};
use crate::state::UserState;
use crate::store::StoredAudio;

/// Where a jump should land.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpTarget {
    /// The last reported position.
    LastPlayed,

    /// The beginning.
    Start,

    /// An explicit position, in seconds.
    At(f64),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Registers an upload that has already been stored.
    Register {
        stored: StoredAudio,
        duration_sec: Option<f64>,
    },
    SelectAsset {
        audio_id: AudioId,
    },
    /// A position reported by the player; `None` carries no information.
    ReportPosition {
        audio_id: AudioId,
        position: Option<f64>,
    },
    Jump {
        audio_id: AudioId,
        target: JumpTarget,
    },
    /// A label click, optionally with the player's position at the time.
    LogEvent {
        label: String,
        note: String,
        position: Option<f64>,
    },
    EditRows {
        rows: Vec<EditedRow>,
    },
    DeleteRows {
        indices: Vec<usize>,
    },
    Undo,
    Clear,
    ForceSave,
}

/// A one-shot effect for the adapter to carry out after an action.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Empty the note field.
    ClearNote,

    /// Remount the player with these parameters.
    MountPlayer {
        audio_id: AudioId,
        start_at: f64,
        version: u64,
    },

    /// Show a non-blocking warning.
    Warn { message: String },
}

/// The result of applying an action.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Outcome {
    /// Whether the state must be flushed.
    #[serde(skip)]
    pub changed: bool,

    pub commands: Vec<Command>,
}

impl Outcome {
    fn unchanged() -> Self {
        Default::default()
    }

    fn changed(commands: Vec<Command>) -> Self {
        Outcome {
            changed: true,
            commands,
        }
    }
}

/// What an action needs besides the state itself.
pub struct Rules<'a> {
    pub labels: &'a [String],
    pub precision: usize,
    /// The current time, in seconds since the Unix epoch.
    pub now: f64,
    /// Whether stored audio still exists at a path.
    pub exists: &'a dyn Fn(&Path) -> bool,
}

/// Applies one action. Actions are validated before anything is
/// mutated, so an error leaves the state as it was.
pub fn apply(state: &mut UserState, action: Action, rules: &Rules) -> Result<Outcome, ProofingError> {
    match action {
        Action::Register {
            stored,
            duration_sec,
        } => {
            let StoredAudio { name, path, id } = stored;

            state.catalogue.register(
                id.clone(),
                AudioAsset {
                    name,
                    path,
                    duration_sec,
                },
            );
            state.last_audio_id = Some(id.clone());

            Ok(Outcome::changed(vec![mount_command(state, &id)]))
        }

        Action::SelectAsset { audio_id } => {
            require_asset(state, &audio_id)?;

            let resolution = state.catalogue.resolve_active(
                Some(audio_id.as_str()),
                state.last_audio_id.as_deref(),
                rules.exists,
            );
            let changed = state.last_audio_id.as_deref() != Some(audio_id.as_str());
            state.last_audio_id = Some(audio_id.clone());

            let command = match resolution {
                Resolution::Ready(audio_id) => mount_command(state, &audio_id),
                _ => unavailable_warning(state, &audio_id),
            };

            Ok(Outcome {
                changed,
                commands: vec![command],
            })
        }

        Action::ReportPosition { audio_id, position } => {
            require_asset(state, &audio_id)?;

            match position {
                Some(seconds) if state.resume.report(&audio_id, seconds) => {
                    Ok(Outcome::changed(vec![]))
                }
                _ => Ok(Outcome::unchanged()),
            }
        }

        Action::Jump { audio_id, target } => {
            require_asset(state, &audio_id)?;

            let seconds = match target {
                JumpTarget::LastPlayed => state.resume.last_played(&audio_id),
                JumpTarget::Start => 0.0,
                JumpTarget::At(seconds) => seconds,
            };
            let mount = state.resume.request_start(&audio_id, seconds);

            Ok(Outcome::changed(vec![Command::MountPlayer {
                audio_id,
                start_at: mount.start_at,
                version: mount.version,
            }]))
        }

        Action::LogEvent {
            label,
            note,
            position,
        } => {
            if !rules.labels.contains(&label) {
                return Err(ProofingError::UnknownLabel(label));
            }

            let active = match state.catalogue.resolve_active(
                None,
                state.last_audio_id.as_deref(),
                rules.exists,
            ) {
                Resolution::Ready(audio_id) | Resolution::Unavailable(audio_id) => state
                    .catalogue
                    .get(&audio_id)
                    .map(|asset| (audio_id.clone(), asset.name.clone())),
                Resolution::Empty => None,
            };

            let event = match active {
                Some((audio_id, name)) => {
                    state.last_audio_id = Some(audio_id.clone());

                    if let Some(seconds) = position {
                        state.resume.report(&audio_id, seconds);
                    }

                    let time_sec = state.resume.last_played(&audio_id);
                    let event = Event::new(name, time_sec, label, note, rules.now, rules.precision);

                    // the logged position becomes the resume point
                    state.resume.report(&audio_id, event.time_sec);
                    event
                }
                None => Event::new(
                    "",
                    position.unwrap_or(0.0),
                    label,
                    note,
                    rules.now,
                    rules.precision,
                ),
            };

            state.events.append(event);

            Ok(Outcome::changed(vec![Command::ClearNote]))
        }

        Action::EditRows { rows } => {
            state.events.replace_all(rows, rules.precision, rules.now);

            Ok(Outcome::changed(vec![]))
        }

        Action::DeleteRows { indices } => {
            let removed = state.events.delete_rows(&indices);

            Ok(Outcome {
                changed: removed > 0,
                commands: vec![],
            })
        }

        Action::Undo => match state.events.undo_last() {
            Some(_) => Ok(Outcome::changed(vec![])),
            None => Ok(Outcome::unchanged()),
        },

        Action::Clear => {
            state.events.clear();

            Ok(Outcome::changed(vec![]))
        }

        Action::ForceSave => Ok(Outcome::changed(vec![])),
    }
}

fn require_asset(state: &UserState, audio_id: &str) -> Result<(), ProofingError> {
    if state.catalogue.contains(audio_id) {
        Ok(())
    } else {
        Err(ProofingError::UnknownAudio(audio_id.to_owned()))
    }
}

fn mount_command(state: &UserState, audio_id: &str) -> Command {
    let mount = state.resume.mount(audio_id);

    Command::MountPlayer {
        audio_id: audio_id.to_owned(),
        start_at: mount.start_at,
        version: mount.version,
    }
}

fn unavailable_warning(state: &UserState, audio_id: &str) -> Command {
    let name = state
        .catalogue
        .get(audio_id)
        .map(|asset| asset.name.as_str())
        .unwrap_or(audio_id);

    Command::Warn {
        message: format!(
            "{} is no longer stored on the server; upload it again to play it",
            name
        ),
    }
}

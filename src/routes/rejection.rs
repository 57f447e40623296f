use serde::Serialize;
use warp::reject;

use crate::errors::ProofingError;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: ProofingError,
}

impl Rejection {
    pub fn new(context: Context, error: ProofingError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            message: format!("{}", self.error),
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) message: String,
}

/// The route a rejection came from, with the parameters it was given.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Context {
    Scope { key: Option<String> },
    State { key: String },
    Upload { key: String, name: Option<String> },
    Select { key: String, audio_id: String },
    Position { key: String, audio_id: String },
    Jump { key: String, audio_id: String },
    LogEvent { key: String, label: String },
    EditRows { key: String },
    DeleteRows { key: String },
    Undo { key: String },
    Clear { key: String },
    Save { key: String },
    Export { key: String },
    Audio { key: String, audio_id: String },
}

impl Context {
    pub fn scope(key: Option<String>) -> Context {
        Context::Scope { key }
    }

    pub fn state(key: String) -> Context {
        Context::State { key }
    }

    pub fn upload(key: String, name: Option<String>) -> Context {
        Context::Upload { key, name }
    }

    pub fn select(key: String, audio_id: String) -> Context {
        Context::Select { key, audio_id }
    }

    pub fn position(key: String, audio_id: String) -> Context {
        Context::Position { key, audio_id }
    }

    pub fn jump(key: String, audio_id: String) -> Context {
        Context::Jump { key, audio_id }
    }

    pub fn log_event(key: String, label: String) -> Context {
        Context::LogEvent { key, label }
    }

    pub fn edit_rows(key: String) -> Context {
        Context::EditRows { key }
    }

    pub fn delete_rows(key: String) -> Context {
        Context::DeleteRows { key }
    }

    pub fn undo(key: String) -> Context {
        Context::Undo { key }
    }

    pub fn clear(key: String) -> Context {
        Context::Clear { key }
    }

    pub fn save(key: String) -> Context {
        Context::Save { key }
    }

    pub fn export(key: String) -> Context {
        Context::Export { key }
    }

    pub fn audio(key: String, audio_id: String) -> Context {
        Context::Audio { key, audio_id }
    }
}

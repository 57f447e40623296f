use serde::Deserialize;

use crate::actions::JumpTarget;
use crate::event::EditedRow;
use crate::normalization;

#[derive(Debug, Deserialize)]
pub struct ScopeRequest {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub audio_id: String,
}

/// A position report from the player. A missing `current_time` means
/// the player had nothing to report.
#[derive(Debug, Deserialize)]
pub struct PositionRequest {
    pub audio_id: String,
    #[serde(default)]
    pub current_time: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct JumpRequest {
    pub audio_id: String,
    pub target: JumpTarget,
}

#[derive(Debug, Deserialize)]
pub struct LogRequest {
    #[serde(deserialize_with = "normalization::deserialize")]
    pub label: String,
    #[serde(default, deserialize_with = "normalization::deserialize_or_empty")]
    pub note: String,
    #[serde(default)]
    pub current_time: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub rows: Vec<EditedRow>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub indices: Vec<usize>,
}

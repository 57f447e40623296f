use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::normalization;
use crate::timecode;

/// The columns of the exported table, in order.
pub const CSV_COLUMNS: [&str; 6] = [
    "audio_file",
    "time_sec",
    "timecode",
    "label",
    "note",
    "logged_at_epoch",
];

/// The file name offered for the exported table.
pub const CSV_FILE_NAME: &str = "proofing_log.csv";

/// One logged defect occurrence. Fields missing or `null` in a stored
/// row take their defaults.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Event {
    /// The display name of the audio it was logged against.
    #[serde(default, deserialize_with = "null_as_default")]
    pub audio_file: String,

    /// The position in the audio, in seconds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_sec: f64,

    /// `time_sec` rendered as a timecode.
    #[serde(default, deserialize_with = "null_as_default")]
    pub timecode: String,

    /// The kind of defect.
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,

    /// The optional note.
    #[serde(default, deserialize_with = "null_as_default")]
    pub note: String,

    /// When the event was logged, in seconds since the Unix epoch.
    #[serde(default, deserialize_with = "null_as_default")]
    pub logged_at_epoch: f64,
}

impl Event {
    pub fn new(
        audio_file: impl Into<String>,
        time_sec: f64,
        label: impl Into<String>,
        note: impl Into<String>,
        logged_at_epoch: f64,
        precision: usize,
    ) -> Self {
        let time_sec = clamp_seconds(time_sec).unwrap_or(0.0);

        Event {
            audio_file: audio_file.into(),
            time_sec,
            timecode: timecode::format(time_sec, precision),
            label: label.into(),
            note: note.into(),
            logged_at_epoch,
        }
    }
}

/// A row as submitted by the table editor. Every field is optional so a
/// partially filled row can still be reconciled with what was stored.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct EditedRow {
    #[serde(default, deserialize_with = "normalization::deserialize_or_empty")]
    pub audio_file: String,

    #[serde(default)]
    pub time_sec: Option<f64>,

    #[serde(default)]
    pub timecode: Option<String>,

    #[serde(default, deserialize_with = "normalization::deserialize_or_empty")]
    pub label: String,

    #[serde(default, deserialize_with = "normalization::deserialize_or_empty")]
    pub note: String,

    #[serde(default)]
    pub logged_at_epoch: Option<f64>,
}

impl From<&Event> for EditedRow {
    fn from(event: &Event) -> Self {
        EditedRow {
            audio_file: event.audio_file.clone(),
            time_sec: Some(event.time_sec),
            timecode: Some(event.timecode.clone()),
            label: event.label.clone(),
            note: event.note.clone(),
            logged_at_epoch: Some(event.logged_at_epoch),
        }
    }
}

/// The ordered list of logged events, in logging order.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventLog(Vec<Event>);

impl EventLog {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.0
    }

    /// Clamps every stored position and renders its timecode again,
    /// keeping the precision each row was written with.
    pub(crate) fn rederive(&mut self) {
        for event in &mut self.0 {
            let precision = stored_precision(&event.timecode);

            event.time_sec = clamp_seconds(event.time_sec).unwrap_or(0.0);
            event.timecode = timecode::format(event.time_sec, precision);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn append(&mut self, event: Event) {
        self.0.push(event);
    }

    /// Removes and returns the most recent event, if any.
    pub fn undo_last(&mut self) -> Option<Event> {
        self.0.pop()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Removes every event matching `predicate`, keeping the others in
    /// order. Returns how many were removed.
    pub fn delete(&mut self, mut predicate: impl FnMut(usize, &Event) -> bool) -> usize {
        let before = self.0.len();
        let mut index = 0;

        self.0.retain(|event| {
            let remove = predicate(index, event);
            index += 1;
            !remove
        });

        before - self.0.len()
    }

    /// Removes the events at the given positions. Positions past the end
    /// are ignored.
    pub fn delete_rows(&mut self, indices: &[usize]) -> usize {
        let indices = indices.iter().copied().collect::<BTreeSet<_>>();

        self.delete(|index, _| indices.contains(&index))
    }

    /// Replaces the whole log with rows from the table editor.
    ///
    /// A row whose timecode was edited takes its new time from the
    /// timecode; otherwise the submitted `time_sec` is used. Unusable
    /// values fall back to what was stored at the same position, so one
    /// bad cell never discards a row.
    pub fn replace_all(&mut self, rows: Vec<EditedRow>, precision: usize, now: f64) {
        let replaced = rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| reconcile(row, self.0.get(index), precision, now))
            .collect();

        self.0 = replaced;
    }

    /// Serializes the log as CSV with a header row.
    pub fn to_csv_bytes(&self) -> Vec<u8> {
        let mut out = String::new();

        write_record(&mut out, CSV_COLUMNS.iter().map(|c| c.to_string()));

        for event in &self.0 {
            write_record(
                &mut out,
                vec![
                    event.audio_file.clone(),
                    format_real(event.time_sec),
                    event.timecode.clone(),
                    event.label.clone(),
                    event.note.clone(),
                    format_real(event.logged_at_epoch),
                ],
            );
        }

        out.into_bytes()
    }
}

fn reconcile(row: EditedRow, stored: Option<&Event>, precision: usize, now: f64) -> Event {
    let stored_time = stored.map(|e| e.time_sec);
    let submitted_time = row.time_sec.and_then(clamp_seconds);

    let timecode_edited = match (&row.timecode, stored) {
        (Some(timecode), Some(stored)) => timecode.trim() != stored.timecode,
        (Some(_), None) => true,
        (None, _) => false,
    };

    let parsed = if timecode_edited {
        row.timecode.as_deref().and_then(timecode::parse)
    } else {
        None
    };

    let time_sec = parsed
        .or(submitted_time)
        .or(stored_time)
        .and_then(clamp_seconds)
        .unwrap_or(0.0);

    let logged_at_epoch = row
        .logged_at_epoch
        .filter(|t| t.is_finite())
        .or_else(|| stored.map(|e| e.logged_at_epoch))
        .unwrap_or(now);

    Event {
        audio_file: row.audio_file,
        time_sec,
        timecode: timecode::format(time_sec, precision),
        label: row.label,
        note: row.note,
        logged_at_epoch,
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The number of fractional digits a stored timecode was written with.
fn stored_precision(timecode: &str) -> usize {
    match timecode.rsplit_once('.') {
        Some((_, fraction)) if fraction.chars().all(|c| c.is_ascii_digit()) => fraction.len(),
        Some(_) => timecode::DEFAULT_PRECISION,
        None if timecode.is_empty() => timecode::DEFAULT_PRECISION,
        None => 0,
    }
}

fn clamp_seconds(seconds: f64) -> Option<f64> {
    if seconds.is_finite() {
        Some(seconds.max(0.0))
    } else {
        None
    }
}

/// Writes a real in its shortest round-trip form, keeping at least one
/// fractional digit and never using an exponent.
fn format_real(value: f64) -> String {
    let shortest = format!("{:?}", value);

    if !shortest.contains('e') {
        return shortest;
    }

    // `Display` spells out every digit
    let plain = value.to_string();

    if plain.contains('.') {
        plain
    } else {
        format!("{}.0", plain)
    }
}

fn write_record(out: &mut String, fields: impl IntoIterator<Item = String>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }

        if field.contains(|c: char| c == ',' || c == '"' || c == '\r' || c == '\n') {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(&field);
        }
    }

    out.push_str("\r\n");
}

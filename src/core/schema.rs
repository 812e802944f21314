//! Day-value schema normalisation.
//!
//! Stored day values come in three generations:
//!
//! - **Structured** (current): `{"todos": [{"text": .., "done": ..}, ..]}`
//! - **Legacy text**: one free-form string per day, one todo per line,
//!   optionally bulleted with `-` or `•`
//! - **Anything else**: unusable, replaced with an empty record
//!
//! [`normalize`] is the single dispatch point between them. It edits the value
//! in place and only when something actually needs fixing, so an entry that
//! is already canonical comes back untouched and reports
//! [`Normalization::Unchanged`]. Callers use that marker to decide whether a
//! migration write is due. Supporting another generation means adding one arm
//! to that dispatch.

use crate::core::model::DayRecord;
use serde_json::{Map, Value as JsonValue};

const TODOS: &str = "todos";
const TEXT: &str = "text";
const DONE: &str = "done";

/// Characters accepted as a list bullet in legacy text.
const BULLETS: [char; 2] = ['-', '•'];

/// Everything `str.splitlines` would treat as a line boundary.
const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// What [`normalize`] had to do to reach the canonical shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// Already canonical; the value was not touched.
    Unchanged,
    /// Structured record with a missing/invalid `todos` list or malformed items.
    Repaired,
    /// Legacy plain-text day converted to a structured record.
    MigratedText,
    /// Unrecognised value replaced with an empty record.
    Reset,
}

impl Normalization {
    pub fn changed(self) -> bool {
        self != Normalization::Unchanged
    }
}

/// Brings any stored day value into the canonical structured shape.
///
/// Total: never fails. Idempotent: a second call always reports
/// [`Normalization::Unchanged`].
pub fn normalize(value: &mut JsonValue) -> Normalization {
    let (replacement, outcome) = match value {
        JsonValue::Object(record) => return repair_record(record),
        JsonValue::String(text) => (migrate_text(text), Normalization::MigratedText),
        _ => (empty_record(), Normalization::Reset),
    };
    *value = replacement;
    outcome
}

/// Normalises and decodes in one step.
pub fn to_record(mut value: JsonValue) -> (DayRecord, Normalization) {
    let outcome = normalize(&mut value);
    match serde_json::from_value(value) {
        Ok(record) => (record, outcome),
        Err(e) => {
            // normalize guarantees the shape; reaching this is a bug.
            tracing::error!(error = %e, "normalised day value failed to decode");
            (DayRecord::default(), Normalization::Reset)
        }
    }
}

/// Splits legacy free text into one open todo per non-empty line.
pub fn parse_legacy_text(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    text.split(LINE_BREAKS)
        .map(strip_bullet)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_bullet(line: &str) -> &str {
    let line = line.trim();
    let line = line.strip_prefix(BULLETS).unwrap_or(line);
    line.trim()
}

fn migrate_text(text: &str) -> JsonValue {
    let todos = parse_legacy_text(text)
        .into_iter()
        .map(|line| item_value(line, false))
        .collect();
    let mut record = Map::new();
    record.insert(TODOS.to_string(), JsonValue::Array(todos));
    JsonValue::Object(record)
}

fn empty_record() -> JsonValue {
    let mut record = Map::new();
    record.insert(TODOS.to_string(), JsonValue::Array(Vec::new()));
    JsonValue::Object(record)
}

fn item_value(text: String, done: bool) -> JsonValue {
    let mut item = Map::new();
    item.insert(TEXT.to_string(), JsonValue::String(text));
    item.insert(DONE.to_string(), JsonValue::Bool(done));
    JsonValue::Object(item)
}

fn repair_record(record: &mut Map<String, JsonValue>) -> Normalization {
    match record.get_mut(TODOS) {
        Some(JsonValue::Array(items)) => {
            if repair_items(items) {
                Normalization::Repaired
            } else {
                Normalization::Unchanged
            }
        }
        _ => {
            record.insert(TODOS.to_string(), JsonValue::Array(Vec::new()));
            Normalization::Repaired
        }
    }
}

fn repair_items(items: &mut Vec<JsonValue>) -> bool {
    let mut changed = false;
    items.retain_mut(|item| match item {
        JsonValue::Object(fields) => {
            changed |= repair_item(fields);
            true
        }
        JsonValue::String(text) => {
            let text = std::mem::take(text);
            *item = item_value(text, false);
            changed = true;
            true
        }
        other => {
            tracing::warn!(item = %other, "dropping todo entry with unusable shape");
            changed = true;
            false
        }
    });
    changed
}

fn repair_item(fields: &mut Map<String, JsonValue>) -> bool {
    let mut changed = false;

    let text = match fields.get(TEXT) {
        Some(JsonValue::String(_)) => None,
        None | Some(JsonValue::Null) => Some(String::new()),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        Some(JsonValue::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    };
    if let Some(text) = text {
        fields.insert(TEXT.to_string(), JsonValue::String(text));
        changed = true;
    }

    let done = match fields.get(DONE) {
        Some(JsonValue::Bool(_)) => None,
        None => Some(false),
        Some(other) => Some(truthy(other)),
    };
    if let Some(done) = done {
        fields.insert(DONE.to_string(), JsonValue::Bool(done));
        changed = true;
    }

    changed
}

fn truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(a) => !a.is_empty(),
        JsonValue::Object(o) => !o.is_empty(),
    }
}

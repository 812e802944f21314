//! Canonical data model for the day planner.
//!
//! A [`Collection`] maps calendar days to [`DayRecord`]s. Keys starting with
//! `_` are reserved for metadata and carried verbatim; keys that are neither
//! reserved nor valid dates are also carried verbatim so that nothing written
//! by another tool is lost on the next save.

use crate::core::error::DaybookError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Prefix marking reserved (non-day) keys in the persisted mapping.
pub const RESERVED_PREFIX: char = '_';
/// Reserved key holding save metadata.
pub const META_KEY: &str = "_meta";
/// Field inside `_meta` stamped on every mutation-triggered save.
pub const LAST_SAVED_AT: &str = "last_saved_at";

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Canonical `YYYY-MM-DD` identifier of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        DayKey(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        DayKey(date)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_KEY_FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = DaybookError;

    /// Strict parse: exactly ten characters, zero-padded.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 10 {
            return Err(DaybookError::InvalidDate(s.to_string()));
        }
        NaiveDate::parse_from_str(s, DAY_KEY_FORMAT)
            .map(DayKey)
            .map_err(|_| DaybookError::InvalidDate(s.to_string()))
    }
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TodoItem {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub done: bool,
    /// Fields written by newer versions, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl TodoItem {
    pub fn new(text: impl Into<String>) -> Self {
        TodoItem {
            text: text.into(),
            done: false,
            extra: Map::new(),
        }
    }

    pub fn has_content(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DayRecord {
    #[serde(default)]
    pub todos: Vec<TodoItem>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl DayRecord {
    pub fn has_content(&self) -> bool {
        self.todos.iter().any(TodoItem::has_content)
    }
}

/// Every day ever touched, plus the reserved and unrecognised keys that share
/// the file with them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Collection {
    days: BTreeMap<DayKey, DayRecord>,
    reserved: Map<String, JsonValue>,
    foreign: Map<String, JsonValue>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn day(&self, key: &DayKey) -> Option<&DayRecord> {
        self.days.get(key)
    }

    pub fn day_mut(&mut self, key: &DayKey) -> Option<&mut DayRecord> {
        self.days.get_mut(key)
    }

    /// Fetches the day, creating an empty record on first access.
    pub fn entry(&mut self, key: DayKey) -> &mut DayRecord {
        self.days.entry(key).or_default()
    }

    pub fn insert_day(&mut self, key: DayKey, record: DayRecord) -> Option<DayRecord> {
        self.days.insert(key, record)
    }

    pub fn days(&self) -> impl Iterator<Item = (&DayKey, &DayRecord)> {
        self.days.iter()
    }

    pub fn reserved(&self) -> &Map<String, JsonValue> {
        &self.reserved
    }

    pub fn foreign(&self) -> &Map<String, JsonValue> {
        &self.foreign
    }

    pub(crate) fn insert_reserved(&mut self, key: String, value: JsonValue) {
        self.reserved.insert(key, value);
    }

    pub(crate) fn insert_foreign(&mut self, key: String, value: JsonValue) {
        self.foreign.insert(key, value);
    }

    pub fn last_saved_at(&self) -> Option<&str> {
        self.reserved
            .get(META_KEY)
            .and_then(|meta| meta.get(LAST_SAVED_AT))
            .and_then(JsonValue::as_str)
    }

    /// Records the save timestamp, keeping any other `_meta` fields.
    pub fn stamp_saved_at(&mut self, stamp: &str) {
        let meta = self
            .reserved
            .entry(META_KEY.to_string())
            .or_insert_with(|| JsonValue::Object(Map::new()));
        if !meta.is_object() {
            *meta = JsonValue::Object(Map::new());
        }
        if let Some(obj) = meta.as_object_mut() {
            obj.insert(
                LAST_SAVED_AT.to_string(),
                JsonValue::String(stamp.to_string()),
            );
        }
    }

    /// Flattens back into the on-disk mapping. Day keys sort
    /// chronologically because the format is zero-padded.
    pub fn to_json(&self) -> Result<JsonValue, DaybookError> {
        let mut out = Map::new();
        for (key, record) in &self.days {
            out.insert(key.to_string(), serde_json::to_value(record)?);
        }
        for (key, value) in self.foreign.iter().chain(self.reserved.iter()) {
            out.insert(key.clone(), value.clone());
        }
        Ok(JsonValue::Object(out))
    }
}

pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with(RESERVED_PREFIX)
}

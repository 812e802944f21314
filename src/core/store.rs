//! Durable storage for the day collection.
//!
//! The whole collection lives in one pretty-printed UTF-8 JSON file: a
//! top-level object mapping `YYYY-MM-DD` keys to day records, plus reserved
//! `_`-prefixed keys such as `_meta`.
//!
//! Loading favours availability: a missing file is an empty collection, and
//! so is an unreadable one, after its bytes have been copied aside to
//! `<file>.corrupt` so the next save cannot destroy them. Only real I/O
//! failures (permissions, disk) surface as [`DaybookError::StorageError`].
//!
//! Saving writes a sibling temp file, fsyncs it and renames it over the
//! target, so a reader never observes a half-written file.
//!
//! # Known limitation: last writer wins
//!
//! The file is meant to be shared through a folder-sync service. There is no
//! locking and no version check: if another process replaces the file between
//! our load and our rename, its changes to any day we also write are lost.
//! The planner narrows the window by reloading right before each commit, but
//! does not close it.

use crate::core::error::DaybookError;
use crate::core::model::{Collection, DayKey, is_reserved_key};
use crate::core::schema;
use chrono::Utc;
use serde_json::{Map, Value as JsonValue};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const QUARANTINE_SUFFIX: &str = "corrupt";
const QUARANTINE_ATTEMPTS: usize = 100;

/// Handle on the backing file.
#[derive(Debug, Clone)]
pub struct Store {
    pub path: PathBuf,
}

/// Result of a load, with what normalisation had to do along the way.
#[derive(Debug, Default)]
pub struct Loaded {
    pub collection: Collection,
    /// Day entries whose stored shape was not canonical.
    pub migrated: usize,
    /// Where the unreadable file was copied, if it was.
    pub quarantined: Option<PathBuf>,
}

impl Loaded {
    pub fn needs_write(&self) -> bool {
        self.migrated > 0
    }
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Store { path: path.into() }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the collection, normalising every day entry.
    pub fn load(&self) -> Result<Collection, DaybookError> {
        Ok(self.load_normalized()?.collection)
    }

    pub fn load_normalized(&self) -> Result<Loaded, DaybookError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no data file yet");
                return Ok(Loaded::default());
            }
            Err(e) => return Err(DaybookError::storage(&self.path, e)),
        };

        let map = match serde_json::from_slice::<JsonValue>(&bytes) {
            Ok(JsonValue::Object(map)) => map,
            Ok(other) => {
                tracing::warn!(
                    path = %self.path.display(),
                    found = json_kind(&other),
                    "data file is not a day mapping; starting empty"
                );
                return self.start_over(&bytes);
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "data file is unreadable; starting empty"
                );
                return self.start_over(&bytes);
            }
        };

        let loaded = collection_from_map(map);
        tracing::debug!(
            path = %self.path.display(),
            days = loaded.collection.len(),
            migrated = loaded.migrated,
            "collection loaded"
        );
        Ok(loaded)
    }

    /// Writes the whole collection atomically.
    pub fn save(&self, collection: &Collection) -> Result<(), DaybookError> {
        let mut body = serde_json::to_string_pretty(&collection.to_json()?)?;
        body.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DaybookError::storage(parent, e))?;
        }

        let tmp = self.temp_path();
        if let Err(e) = write_then_rename(&tmp, &self.path, body.as_bytes()) {
            let _ = fs::remove_file(&tmp);
            return Err(DaybookError::storage(&self.path, e));
        }
        tracing::debug!(
            path = %self.path.display(),
            days = collection.len(),
            bytes = body.len(),
            "collection saved"
        );
        Ok(())
    }

    /// Default location of the quarantine copy.
    pub fn quarantine_path(&self) -> PathBuf {
        self.sibling(QUARANTINE_SUFFIX)
    }

    fn start_over(&self, bytes: &[u8]) -> Result<Loaded, DaybookError> {
        let quarantined = self.quarantine(bytes)?;
        tracing::warn!(
            path = %self.path.display(),
            copy = %quarantined.display(),
            "unreadable data preserved"
        );
        Ok(Loaded {
            quarantined: Some(quarantined),
            ..Loaded::default()
        })
    }

    /// Copies `bytes` next to the data file. An identical earlier copy is
    /// reused; a different one is never overwritten.
    fn quarantine(&self, bytes: &[u8]) -> Result<PathBuf, DaybookError> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f").to_string();
        self.quarantine_stamped(bytes, &stamp)
    }

    fn quarantine_stamped(&self, bytes: &[u8], stamp: &str) -> Result<PathBuf, DaybookError> {
        let primary = self.quarantine_path();
        match fs::read(&primary) {
            Ok(existing) if existing == bytes => return Ok(primary),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if write_new(&primary, bytes).map_err(|e| DaybookError::storage(&primary, e))? {
                    return Ok(primary);
                }
            }
            Err(e) => return Err(DaybookError::storage(&primary, e)),
        }

        for attempt in 0..QUARANTINE_ATTEMPTS {
            let suffix = match attempt {
                0 => format!("{QUARANTINE_SUFFIX}.{stamp}"),
                n => format!("{QUARANTINE_SUFFIX}.{stamp}-{n}"),
            };
            let target = self.sibling(&suffix);
            if write_new(&target, bytes).map_err(|e| DaybookError::storage(&target, e))? {
                return Ok(target);
            }
        }
        Err(DaybookError::storage(
            &primary,
            io::Error::new(io::ErrorKind::AlreadyExists, "no free quarantine file name"),
        ))
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling(&format!("tmp.{}", std::process::id()))
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("daybook"));
        name.push(".");
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

/// Splits a raw top-level mapping into days, reserved and foreign keys,
/// normalising each day on the way.
pub fn collection_from_map(map: Map<String, JsonValue>) -> Loaded {
    let mut loaded = Loaded::default();
    for (key, value) in map {
        if is_reserved_key(&key) {
            loaded.collection.insert_reserved(key, value);
            continue;
        }
        match key.parse::<DayKey>() {
            Ok(day) => {
                let (record, outcome) = schema::to_record(value);
                if outcome.changed() {
                    tracing::debug!(day = %day, ?outcome, "day entry normalised");
                    loaded.migrated += 1;
                }
                loaded.collection.insert_day(day, record);
            }
            Err(_) => {
                tracing::warn!(key = %key, "keeping entry with non-date key as-is");
                loaded.collection.insert_foreign(key, value);
            }
        }
    }
    loaded
}

fn write_then_rename(tmp: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp, target)
}

/// Writes `bytes` to a file that must not exist yet. `Ok(false)` when it does.
fn write_new(path: &Path, bytes: &[u8]) -> io::Result<bool> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(bytes)?;
            file.sync_all()?;
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

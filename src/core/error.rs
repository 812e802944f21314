use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaybookError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Storage error at {}: {source}", path.display())]
    StorageError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Nothing to add: item text is empty")]
    EmptyInput,
    #[error("Index {index} is out of range for {day} ({len} item(s))")]
    InvariantViolation {
        day: String,
        index: usize,
        len: usize,
    },
    #[error("Unknown time zone: {0}")]
    InvalidTimeZone(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Config error: {0}")]
    ConfigError(String),
}

impl DaybookError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        DaybookError::StorageError {
            path: path.into(),
            source,
        }
    }

    /// Validation conditions are shown to the user as warnings, everything
    /// else is a failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, DaybookError::EmptyInput)
    }
}

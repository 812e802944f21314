//! Planner configuration.
//!
//! Loaded from `daybook.toml` in the working directory (or an explicit
//! `--config` path). Environment variables override the file, CLI flags
//! override both. The time zone is never discovered from the host: a file
//! shared between two machines must resolve every day key the same way.

use crate::core::error::DaybookError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "daybook.toml";
pub const DEFAULT_TIME_ZONE: &str = "Asia/Shanghai";
pub const DEFAULT_DATA_FILE: &str = "calendar.json";
pub const DEFAULT_MARKER_TITLE: &str = "•";

pub const ENV_TIME_ZONE: &str = "DAYBOOK_TZ";
pub const ENV_DATA_FILE: &str = "DAYBOOK_FILE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// IANA zone used to turn instants into calendar days.
    pub time_zone: String,
    /// Backing JSON file; relative paths resolve against the config's directory.
    pub data_file: PathBuf,
    /// Glyph shown on month-grid days that have content.
    pub marker_title: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            marker_title: DEFAULT_MARKER_TITLE.to_string(),
        }
    }
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub data_file: Option<PathBuf>,
    pub time_zone: Option<String>,
}

impl Config {
    /// Parses a TOML document. Missing keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self, DaybookError> {
        let config: Config = toml::from_str(content)?;
        config.tz()?;
        Ok(config)
    }

    /// Reads `path` if it exists; a missing file yields the defaults.
    pub fn load_file(path: &Path) -> Result<Self, DaybookError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path).map_err(|e| DaybookError::storage(path, e))?;
        let mut config = Config::from_toml(&content)
            .map_err(|e| DaybookError::ConfigError(format!("{}: {}", path.display(), e)))?;
        if config.data_file.is_relative() {
            if let Some(dir) = path.parent() {
                config.data_file = dir.join(&config.data_file);
            }
        }
        Ok(config)
    }

    /// Full resolution chain: defaults, file, environment, flags.
    pub fn resolve(base_dir: &Path, overrides: &Overrides) -> Result<Self, DaybookError> {
        let explicit = overrides.config_path.is_some();
        let path = overrides
            .config_path
            .clone()
            .unwrap_or_else(|| base_dir.join(CONFIG_FILE_NAME));
        if explicit && !path.exists() {
            return Err(DaybookError::ConfigError(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let mut config = Config::load_file(&path)?;
        if !explicit && !path.exists() {
            config.data_file = base_dir.join(&config.data_file);
        }

        if let Ok(tz) = env::var(ENV_TIME_ZONE) {
            if !tz.trim().is_empty() {
                config.time_zone = tz.trim().to_string();
            }
        }
        if let Ok(file) = env::var(ENV_DATA_FILE) {
            if !file.trim().is_empty() {
                config.data_file = base_dir.join(file.trim());
            }
        }

        if let Some(tz) = &overrides.time_zone {
            config.time_zone = tz.clone();
        }
        if let Some(file) = &overrides.data_file {
            config.data_file = base_dir.join(file);
        }

        config.tz()?;
        tracing::debug!(
            time_zone = %config.time_zone,
            data_file = %config.data_file.display(),
            "configuration resolved"
        );
        Ok(config)
    }

    pub fn tz(&self) -> Result<Tz, DaybookError> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|_| DaybookError::InvalidTimeZone(self.time_zone.clone()))
    }
}

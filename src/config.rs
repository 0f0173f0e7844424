//! fleetcaf configuration.
//!
//! Loaded from `~/.fleetcaf/config.toml`. The file and every key in it are
//! optional.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// fleetcaf configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// The staff id to act as when neither `--as` nor `FLEETCAF_STAFF` is given.
    pub staff: Option<String>,

    /// Path to the SQLite database. Defaults to `~/.fleetcaf/fleetcaf.sqlite`.
    pub database: Option<PathBuf>,
}

impl Config {
    /// Load config from `~/.fleetcaf/config.toml`, or defaults if there is none.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from `path`. A missing file yields defaults; an invalid one is an error.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        toml::from_str(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// The config file path: `~/.fleetcaf/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".fleetcaf").join("config.toml"))
    }
}

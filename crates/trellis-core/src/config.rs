//! Store configuration, loaded from a TOML file.
//!
//! Every field has a default so a missing or empty file yields a working
//! configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrellisConfig {
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the SQLite database file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Busy timeout for store connections, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    /// The busy timeout as a [`Duration`].
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("trellis-menus.sqlite3")
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Load configuration from `path`. A missing file yields the defaults.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<TrellisConfig> {
    if !path.exists() {
        return Ok(TrellisConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{TrellisConfig, load_config};
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = load_config(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(config, TrellisConfig::default());
    }

    #[test]
    fn empty_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("trellis.toml");
        std::fs::File::create(&path).expect("create");

        let config = load_config(&path).expect("load");
        assert_eq!(config, TrellisConfig::default());
    }

    #[test]
    fn partial_file_keeps_unlisted_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("trellis.toml");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, "[store]\npath = \"menus/site.sqlite3\"").expect("write");

        let config = load_config(&path).expect("load");
        assert_eq!(config.store.path.to_str(), Some("menus/site.sqlite3"));
        assert_eq!(config.store.busy_timeout_ms, 5_000);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("trellis.toml");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, "store = 3").expect("write");

        assert!(load_config(&path).is_err());
    }
}

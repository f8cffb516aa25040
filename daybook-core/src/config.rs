//! Configuration for daybook
//!
//! Read from `config.toml` in the daybook config directory. Every section
//! and key is optional. Directories follow XDG base-directory conventions:
//!
//! | Purpose | Directory |
//! |---------|-----------|
//! | config | `$XDG_CONFIG_HOME/daybook` (~/.config/daybook) |
//! | data | `$XDG_DATA_HOME/daybook` (~/.local/share/daybook) |
//! | logs | `$XDG_STATE_HOME/daybook` (~/.local/state/daybook) |

use crate::analytics::InsightThresholds;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "daybook";

/// `$var` if set, otherwise `fallback` under the home directory.
fn xdg_dir(var: &str, fallback: &str) -> PathBuf {
    if let Some(dir) = std::env::var_os(var).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(fallback)
}

/// Top-level `config.toml` contents
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `[user]`
    pub user: UserConfig,
    /// `[logging]`
    pub logging: LoggingConfig,
    /// `[insights]`
    pub insights: InsightThresholds,
}

/// Whose journal the CLI reads and writes when `--owner` is not given.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub owner_id: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            owner_id: "local".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset ("info", "daybook_core=debug")
    pub level: String,
    /// Daily log files kept before the oldest is removed
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            max_files: 5,
        }
    }
}

impl Config {
    /// Load `config.toml` from the config directory, falling back to
    /// defaults when the file does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        match Self::load_from(&path) {
            Err(Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Load and validate a specific config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.insights.validate()?;
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        xdg_dir("XDG_CONFIG_HOME", ".config")
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Where the database lives
    pub fn data_dir() -> PathBuf {
        xdg_dir("XDG_DATA_HOME", ".local/share").join(APP_DIR)
    }

    /// Where log files are written
    pub fn state_dir() -> PathBuf {
        xdg_dir("XDG_STATE_HOME", ".local/state").join(APP_DIR)
    }

    pub fn database_path() -> PathBuf {
        Self::data_dir().join("daybook.db")
    }
}

//! Runtime settings and watched-directory discovery.
//!
//! Settings are read from a TOML file. The category table is fixed; only
//! operational choices are configurable.
//!
//! # Configuration File Format
//!
//! ```toml
//! watched_dir = "~/storage/downloads"
//! folder_collision = "suffix"   # or "fail"
//!
//! [tokens]
//! organize = "confirm"
//! organize_by_date = "confirm"
//! clean = "clean"
//! prune = "remove"
//! ```

use crate::confirm::ConfirmTokens;
use crate::file_organizer::FolderCollisionPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading settings.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Operational settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory to organize. `~/` is expanded against `$HOME`.
    pub watched_dir: Option<PathBuf>,
    /// Words the operator types to confirm each operation.
    pub tokens: ConfirmTokens,
    /// Handling of name clashes under `Pastas_Organizadas/`.
    pub folder_collision: FolderCollisionPolicy,
}

impl Settings {
    /// Load settings from a file, with fallback to defaults.
    ///
    /// Attempts to load settings in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.downtidy.toml` in the current directory
    /// 3. Look for `~/.config/downtidy/config.toml` in home directory
    /// 4. Fall back to default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a file is explicitly provided but cannot be read,
    /// or if any file found is not valid TOML.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".downtidy.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(".config").join("downtidy").join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let settings: Self =
            toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;

        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Picks the directory to operate on.
    ///
    /// An explicit path wins, then `watched_dir`, then the Termux downloads
    /// folder `~/storage/downloads` when it exists, then `~/Downloads`.
    pub fn discover_root(&self, explicit: Option<&Path>) -> PathBuf {
        self.discover_root_in(explicit, home_dir().as_deref())
    }

    fn discover_root_in(&self, explicit: Option<&Path>, home: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }

        if let Some(configured) = &self.watched_dir {
            return expand_home(configured, home);
        }

        let Some(home) = home else {
            return PathBuf::from(".");
        };

        let termux = home.join("storage").join("downloads");
        if termux.is_dir() {
            termux
        } else {
            home.join("Downloads")
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

//! Shell configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory under the user configuration dir.
const CONFIG_DIR: &str = "nemo-messages";
/// Configuration file name.
const CONFIG_FILE: &str = "config.json";

/// Failure to persist the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the user config directory")]
    NoConfigDir,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Shell configuration stored as JSON in the user config directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Present the window full-screen when showing a view.
    pub fullscreen: bool,
    /// Window width used when the scene root reports no size.
    pub window_width: u32,
    /// Window height used when the scene root reports no size.
    pub window_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fullscreen: true,
            window_width: 480,
            window_height: 854,
        }
    }
}

impl Config {
    /// Load configuration from disk, falling back to defaults if missing
    /// or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            tracing::warn!("could not determine the user config directory, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => {
                    tracing::info!(?config, "loaded config");
                    config
                }
                Err(err) => {
                    tracing::error!(%err, ?path, "failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                tracing::error!(%err, ?path, "failed to read config, using defaults");
                Self::default()
            }
        }
    }

    fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

//! Configuration file
//!
//! A single TOML file under the user's config directory. A missing file is
//! not an error: the defaults are written back so the user has something to
//! edit, and the application keeps running with them.

use crate::controller::RepeatPolicy;
use crate::keyboard::{default_bindings, KeyBinding};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn, Level};

const CONFIG_DIR: &str = "padstate";
const CONFIG_FILE: &str = "config.toml";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Acquisition {
    #[default]
    Push,
    Poll,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadConfig {
    pub acquisition: Acquisition,
    /// Slot polled in poll mode
    pub slot: usize,
    pub frame_interval_ms: u64,
    pub deadzone: f32,
    pub log_level: String,
    pub repeat: RepeatPolicy,
    pub keyboard: Vec<KeyBinding>,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            acquisition: Acquisition::Push,
            slot: 0,
            frame_interval_ms: 16,
            deadzone: 0.05,
            log_level: "info".to_string(),
            repeat: RepeatPolicy::default(),
            keyboard: default_bindings(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("No config directory available on this platform")]
    NoConfigDir,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl PadConfig {
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Ok(path)
    }

    /// Load from `path`, or from [`PadConfig::default_path`] when `None`.
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        if !exists {
            info!("No config at {}, writing defaults", path.display());
            let config = Self::default();
            config.save(&path).await?;
            return Ok(config);
        }

        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        let config: Self = toml::from_str(&text)?;
        info!("Loaded config from {}", path.display());
        Ok(config.validated())
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| ConfigError::Write {
                    path: dir.to_path_buf(),
                    source,
                })?;
        }
        let text = toml::to_string_pretty(self)?;
        tokio::fs::write(path, text)
            .await
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn log_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or_else(|_| {
            warn!("Unknown log level {:?}, using info", self.log_level);
            Level::INFO
        })
    }

    fn validated(mut self) -> Self {
        if !(0.0..1.0).contains(&self.deadzone) {
            warn!("Deadzone {} out of range, using 0.05", self.deadzone);
            self.deadzone = 0.05;
        }
        if self.frame_interval_ms == 0 {
            warn!("Frame interval of 0ms, using 16ms");
            self.frame_interval_ms = 16;
        }
        self
    }
}

//! Path management for gemchat files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/gemchat/           # Config directory
//! ├── config.toml              # Application configuration
//! └── store.json               # Key-value store (history, credential)
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "gemchat";

/// Default file name offered for transcript exports.
pub const DEFAULT_EXPORT_FILE: &str = "gemini_history.json";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolves gemchat paths, optionally under an explicit base directory.
#[derive(Debug, Clone, Default)]
pub struct ChatPaths {
    base: Option<PathBuf>,
}

impl ChatPaths {
    /// Uses the platform config directory (e.g. `~/.config/gemchat/`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Roots every path under `base` instead of the platform directory.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
        }
    }

    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.base {
            Some(base) => Ok(base.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn store_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("store.json"))
    }
}

//! Configuration service.
//!
//! Loads [`AppConfig`] from `config.toml` and resolves the credential.

use std::path::{Path, PathBuf};

use gemchat_core::config::AppConfig;
use gemchat_core::storage::KeyValueStore;
use gemchat_core::{ChatError, Result};
use tracing::{debug, warn};

use crate::storage::AtomicFile;

/// Loads and saves the application configuration.
#[derive(Clone)]
pub struct ConfigService {
    file: AtomicFile<AppConfig>,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicFile::toml(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Loads the configuration; a missing or empty file yields defaults.
    pub fn load(&self) -> Result<AppConfig> {
        match self.file.load()? {
            Some(config) => Ok(config),
            None => {
                debug!(path = %self.file.path().display(), "No config file, using defaults");
                Ok(AppConfig::default())
            }
        }
    }

    pub fn save(&self, config: &AppConfig) -> Result<()> {
        self.file.save(config).map_err(ChatError::from)
    }
}

/// Where a resolved credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    Store,
}

/// Resolves the credential: the environment variable named by
/// `config.api_key_env` first, then the store. There is no built-in default.
pub async fn resolve_credential(
    config: &AppConfig,
    store: &dyn KeyValueStore,
) -> Option<(String, CredentialSource)> {
    if let Ok(value) = std::env::var(&config.api_key_env) {
        if !value.trim().is_empty() {
            return Some((value, CredentialSource::Environment));
        }
    }

    match store.read(&config.storage.credential_key).await {
        Ok(Some(value)) if !value.trim().is_empty() => Some((value, CredentialSource::Store)),
        Ok(_) => None,
        Err(err) => {
            warn!(error = %err, "Failed to read stored credential");
            None
        }
    }
}

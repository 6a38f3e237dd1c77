//! Key-value store persisted as a single JSON object on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use gemchat_core::storage::KeyValueStore;
use gemchat_core::{ChatError, Result};

use super::atomic_file::AtomicFile;

type StoreMap = BTreeMap<String, String>;

/// A [`KeyValueStore`] backed by a JSON file such as `~/.config/gemchat/store.json`.
///
/// Every write rewrites the whole file atomically under a lock, so the last
/// writer wins.
#[derive(Clone)]
pub struct JsonFileStore {
    file: AtomicFile<StoreMap>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicFile::json(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let file = self.file.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || -> Result<Option<String>> {
            let map = file.load()?.unwrap_or_default();
            Ok(map.get(&key).cloned())
        })
        .await
        .map_err(|e| ChatError::internal(format!("store read task failed: {e}")))?
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let file = self.file.clone();
        let key = key.to_string();
        let value = value.to_string();
        tokio::task::spawn_blocking(move || -> Result<()> {
            file.update(StoreMap::new(), |map| {
                map.insert(key, value);
                Ok(())
            })
            .map_err(ChatError::from)
        })
        .await
        .map_err(|e| ChatError::internal(format!("store write task failed: {e}")))?
    }
}

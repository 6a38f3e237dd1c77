//! In-memory key-value store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use gemchat_core::Result;
use gemchat_core::storage::KeyValueStore;
use tokio::sync::RwLock;

/// A [`KeyValueStore`] that lives only as long as the process.
///
/// Used when no store file is wanted and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_last_writer_wins() {
        let store = MemoryStore::new();

        store.write("k", "first").await.unwrap();
        store.write("k", "second").await.unwrap();

        assert_eq!(store.read("k").await.unwrap(), Some("second".to_string()));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_clones_share_values() {
        let store = MemoryStore::new();
        let clone = store.clone();

        clone.write("k", "v").await.unwrap();

        assert_eq!(store.read("k").await.unwrap(), Some("v".to_string()));
    }
}

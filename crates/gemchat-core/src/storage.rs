//! Persistent key-value store trait.
//!
//! Defines the narrow interface through which the transcript and the
//! credential are persisted between runs.

use crate::error::Result;
use async_trait::async_trait;

/// Default key holding the serialized transcript (JSON array of messages).
pub const HISTORY_KEY: &str = "gemini_history";
/// Default key holding the last entered credential.
pub const CREDENTIAL_KEY: &str = "gemini_api";

/// A flat, client-scoped string store.
///
/// Values are opaque blobs; the store enforces no schema. Writes are
/// last-writer-wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: Value found
    /// - `Ok(None)`: Nothing stored under `key`
    /// - `Err(_)`: The store could not be read
    async fn read(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn write(&self, key: &str, value: &str) -> Result<()>;
}

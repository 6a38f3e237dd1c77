//! Application configuration.
//!
//! Loaded from `config.toml`; every field has a default so a missing or
//! partial file is valid. No credential is ever stored here.

use serde::{Deserialize, Serialize};

use crate::storage::{CREDENTIAL_KEY, HISTORY_KEY};

pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Model used when the capability is initialized.
    pub model: String,
    /// Send attachment bytes inline with each request.
    pub send_file_contents: bool,
    /// Environment variable consulted for the credential before the store.
    pub api_key_env: String,
    pub storage: StorageConfig,
    pub gemini: GeminiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            send_file_contents: false,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            storage: StorageConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

/// Keys used in the key-value store.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub history_key: String,
    pub credential_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_key: HISTORY_KEY.to_string(),
            credential_key: CREDENTIAL_KEY.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,
    /// Client-side request timeout in seconds; `None` keeps the HTTP client default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout_secs: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.storage.history_key, "gemini_history");
        assert_eq!(config.storage.credential_key, "gemini_api");
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
model = "gemini-2.5-flash"
send_file_contents = true

[gemini]
timeout_secs = 30
"#,
        )
        .unwrap();

        assert_eq!(config.model, "gemini-2.5-flash");
        assert!(config.send_file_contents);
        assert_eq!(config.gemini.timeout_secs, Some(30));
        assert_eq!(config.gemini.base_url, DEFAULT_GEMINI_BASE_URL);
    }
}

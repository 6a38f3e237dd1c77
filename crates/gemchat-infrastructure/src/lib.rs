pub mod attachment_loader;
pub mod config_service;
pub mod paths;
pub mod storage;

pub use crate::attachment_loader::load_attachment;
pub use crate::config_service::{ConfigService, CredentialSource, resolve_credential};
pub use crate::paths::{ChatPaths, DEFAULT_EXPORT_FILE};
pub use crate::storage::{JsonFileStore, MemoryStore};

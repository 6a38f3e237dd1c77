//! File-backed storage primitives and key-value store adapters.

pub mod atomic_file;
pub mod file_store;
pub mod memory_store;

pub use atomic_file::{AtomicFile, AtomicFileError, FileFormat};
pub use file_store::JsonFileStore;
pub use memory_store::MemoryStore;

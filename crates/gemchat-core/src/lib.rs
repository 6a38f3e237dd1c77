//! Core domain for gemchat.
//!
//! Holds the transcript model, the traits at the external seams (generation
//! capability, key-value store, presenter) and the [`ResponseReconciler`]
//! that ties them together.

pub mod config;
pub mod error;
pub mod generation;
pub mod presentation;
pub mod reconciler;
pub mod state;
pub mod storage;
pub mod transcript;

// Re-export common types
pub use error::{ChatError, Result};
pub use reconciler::{GenerationOutcome, ResponseReconciler, SENTINEL_MARKER};
pub use state::ChatState;

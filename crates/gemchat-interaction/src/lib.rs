//! Generation capability bindings.

pub mod gemini_api_agent;
pub mod sse;
pub mod supported_models;

pub use gemini_api_agent::GeminiApiAgent;
pub use supported_models::{DEFAULT_GEMINI_MODEL, SUPPORTED_MODELS, is_supported};

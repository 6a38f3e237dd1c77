//! Supported Gemini model versions.
//!
//! | Model ID | Notes |
//! |----------|-------|
//! | `gemini-2.5-pro` | Default selection |
//! | `gemini-2.5-flash` | Fast; used when a blank model name is configured |
//! | `gemini-2.5-flash-lite` | Lightest option |
//! | `gemini-1.5-flash` | Legacy |
//! | `gemini-pro` | Legacy |
//!
//! Reference: <https://ai.google.dev/gemini-api/docs/models>
//!
//! When adding a model, update [`SUPPORTED_MODELS`] and this table. The
//! default selection lives in `gemchat_core::config::DEFAULT_MODEL`.

/// Model used when a blank model name reaches the agent.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Models offered for selection, in display order.
pub const SUPPORTED_MODELS: &[&str] = &[
    "gemini-2.5-pro",
    "gemini-2.5-flash",
    "gemini-2.5-flash-lite",
    "gemini-1.5-flash",
    "gemini-pro",
];

pub fn is_supported(model: &str) -> bool {
    SUPPORTED_MODELS.contains(&model)
}

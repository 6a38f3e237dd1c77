//! Creation of generation capabilities from a credential.

use std::sync::Arc;

use gemchat_core::config::AppConfig;
use gemchat_core::generation::{GenerationCapability, GenerationError};
use gemchat_interaction::GeminiApiAgent;

/// Builds a capability for the configured model.
///
/// Called again whenever the credential or the selected model changes.
pub trait CapabilityFactory: Send + Sync {
    fn create(
        &self,
        credential: &str,
        config: &AppConfig,
    ) -> Result<Arc<dyn GenerationCapability>, GenerationError>;
}

/// Factory for the Gemini REST binding.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeminiCapabilityFactory;

impl CapabilityFactory for GeminiCapabilityFactory {
    fn create(
        &self,
        credential: &str,
        config: &AppConfig,
    ) -> Result<Arc<dyn GenerationCapability>, GenerationError> {
        Ok(Arc::new(GeminiApiAgent::from_config(credential, config)?))
    }
}

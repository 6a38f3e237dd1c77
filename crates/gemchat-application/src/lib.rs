//! Application layer for gemchat.
//!
//! Wires the reconciler, the store and the generation binding together
//! behind [`ChatUseCase`].

pub mod capability_factory;
pub mod chat_usecase;

pub use capability_factory::{CapabilityFactory, GeminiCapabilityFactory};
pub use chat_usecase::ChatUseCase;

//! Generation capability trait.
//!
//! Defines the interface to the hosted model endpoint.

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

use super::request::GenerationRequest;
use super::response::GenerationResponse;

/// Errors raised by a generation capability.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The capability could not be created (e.g. missing credential).
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// The request never reached the endpoint or the connection dropped.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with an error status.
    #[error("API error{}: {message}", .status.map(|s| format!(" {s}")).unwrap_or_default())]
    Api {
        status: Option<u16>,
        message: String,
        retryable: bool,
    },

    /// The endpoint did not return a stream.
    #[error("response is not streamable: {0}")]
    NotStreamable(String),

    /// A stream unit could not be decoded.
    #[error("malformed chunk: {0}")]
    MalformedChunk(String),

    /// The request had nothing to send.
    #[error("empty request")]
    EmptyRequest,
}

impl GenerationError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { retryable, .. } => *retryable,
            Self::Transport(_) => true,
            _ => false,
        }
    }
}

/// Stream of response units produced by a streaming call.
pub type ResponseStream = BoxStream<'static, Result<GenerationResponse, GenerationError>>;

/// The hosted service that turns a request into generated text.
///
/// Implementations are consumed by the reconciler, which calls
/// [`generate_stream`](Self::generate_stream) first and
/// [`generate`](Self::generate) only when streaming fails.
#[async_trait]
pub trait GenerationCapability: Send + Sync {
    /// Model identifier used by this capability.
    fn model(&self) -> &str;

    /// Starts a streaming call.
    ///
    /// # Returns
    ///
    /// - `Ok(ResponseStream)`: stream of units, which may still fail mid-way
    /// - `Err(_)`: the stream could not be opened
    async fn generate_stream(
        &self,
        request: &GenerationRequest,
    ) -> Result<ResponseStream, GenerationError>;

    /// Performs a single non-streaming call.
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError>;
}

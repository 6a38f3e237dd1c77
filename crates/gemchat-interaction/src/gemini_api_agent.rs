//! GeminiApiAgent - Direct REST API binding for Gemini.
//!
//! Uses `generateContent` for single calls and
//! `streamGenerateContent?alt=sse` for streaming. Inline attachment payloads
//! travel base64-encoded inside the JSON body. The API key is sent in the
//! `x-goog-api-key` header and never appears in a URL, so transport error
//! text is safe to record in the transcript.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use futures::stream::{BoxStream, Stream};
use futures::StreamExt;
use gemchat_core::config::{AppConfig, DEFAULT_GEMINI_BASE_URL};
use gemchat_core::generation::{
    GenerationCapability, GenerationError, GenerationRequest, GenerationResponse, RequestPart,
    ResponseStream,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::sse::SseDecoder;
use crate::supported_models::DEFAULT_GEMINI_MODEL;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Capability implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiApiAgent {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl std::fmt::Debug for GeminiApiAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiApiAgent")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiApiAgent {
    /// Creates an agent for `model`.
    ///
    /// Fails with [`GenerationError::Initialization`] when the API key is blank.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        Self::build(api_key.into(), model.into(), DEFAULT_GEMINI_BASE_URL.to_string(), None)
    }

    /// Creates an agent using the model, endpoint and timeout from `config`.
    pub fn from_config(
        api_key: impl Into<String>,
        config: &AppConfig,
    ) -> Result<Self, GenerationError> {
        Self::build(
            api_key.into(),
            config.model.clone(),
            config.gemini.base_url.clone(),
            config.gemini.timeout_secs.map(Duration::from_secs),
        )
    }

    fn build(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Option<Duration>,
    ) -> Result<Self, GenerationError> {
        if api_key.trim().is_empty() {
            return Err(GenerationError::Initialization(
                "Gemini API key is empty".into(),
            ));
        }

        let model = if model.trim().is_empty() {
            DEFAULT_GEMINI_MODEL.to_string()
        } else {
            model
        };

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|err| {
            GenerationError::Initialization(format!("Failed to build HTTP client: {err}"))
        })?;

        info!(model = %model, "Initialized Gemini agent");

        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{method}", self.base_url, self.model)
    }

    async fn post(
        &self,
        url: String,
        body: &GenerateContentRequest,
    ) -> Result<Response, GenerationError> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                GenerationError::Transport(format!(
                    "Gemini API request failed: {}",
                    err.without_url()
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        Ok(response)
    }
}

#[async_trait]
impl GenerationCapability for GeminiApiAgent {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate_stream(
        &self,
        request: &GenerationRequest,
    ) -> Result<ResponseStream, GenerationError> {
        let body = GenerateContentRequest::from_request(request)?;
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let response = self.post(url, &body).await?;

        ensure_event_stream(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        )?;

        Ok(sse_units(response))
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, GenerationError> {
        let body = GenerateContentRequest::from_request(request)?;
        let response = self.post(self.endpoint("generateContent"), &body).await?;

        let raw: serde_json::Value = response.json().await.map_err(|err| {
            GenerationError::MalformedChunk(format!(
                "Failed to parse Gemini response: {}",
                err.without_url()
            ))
        })?;

        decode_whole_response(raw)
    }
}

/// Rejects responses that are not server-sent events.
fn ensure_event_stream(content_type: Option<&str>) -> Result<(), GenerationError> {
    let content_type = content_type.unwrap_or_default();
    if content_type.starts_with("text/event-stream") {
        Ok(())
    } else {
        Err(GenerationError::NotStreamable(format!(
            "unexpected content type '{content_type}'"
        )))
    }
}

struct SseState {
    bytes: BoxStream<'static, Result<Vec<u8>, GenerationError>>,
    decoder: SseDecoder,
    queue: VecDeque<String>,
    finished: bool,
}

/// Turns an SSE response body into a stream of text units.
fn sse_units(response: Response) -> ResponseStream {
    decode_sse(response.bytes_stream().map(|chunk| {
        chunk.map(|bytes| bytes.to_vec()).map_err(|err| {
            GenerationError::Transport(format!("Stream read error: {}", err.without_url()))
        })
    }))
}

/// Decodes SSE bytes into text units.
///
/// The stream ends after the first error; an event still buffered when the
/// bytes run out is flushed.
fn decode_sse<S>(bytes: S) -> ResponseStream
where
    S: Stream<Item = Result<Vec<u8>, GenerationError>> + Send + 'static,
{
    let state = SseState {
        bytes: bytes.boxed(),
        decoder: SseDecoder::new(),
        queue: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(data) = state.queue.pop_front() {
                match decode_stream_event(&data) {
                    Ok(Some(unit)) => return Some((Ok(unit), state)),
                    Ok(None) => continue,
                    Err(err) => {
                        state.finished = true;
                        state.queue.clear();
                        return Some((Err(err), state));
                    }
                }
            }

            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(bytes)) => {
                    let events = state.decoder.push(&bytes);
                    state.queue.extend(events);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((Err(err), state));
                }
                None => {
                    state.finished = true;
                    let events = state.decoder.finish();
                    state.queue.extend(events);
                }
            }
        }
    })
    .boxed()
}

/// Decodes one SSE data payload.
///
/// Events without text (usage or finish metadata) yield `Ok(None)`.
fn decode_stream_event(data: &str) -> Result<Option<GenerationResponse>, GenerationError> {
    if data.trim() == "[DONE]" {
        return Ok(None);
    }

    let raw: serde_json::Value = serde_json::from_str(data)
        .map_err(|err| GenerationError::MalformedChunk(format!("{err}: {data}")))?;
    check_error_payload(&raw)?;

    let event: GenerateContentResponse = serde_json::from_value(raw)
        .map_err(|err| GenerationError::MalformedChunk(err.to_string()))?;
    let text = extract_text(&event);
    debug!(has_text = text.is_some(), "Decoded Gemini stream event");

    Ok(text.map(GenerationResponse::Text))
}

/// Decodes a `generateContent` body.
///
/// Falls back to the raw JSON when no text part is found, leaving the final
/// decision to the response-shape decoder.
fn decode_whole_response(raw: serde_json::Value) -> Result<GenerationResponse, GenerationError> {
    check_error_payload(&raw)?;

    let text = serde_json::from_value::<GenerateContentResponse>(raw.clone())
        .ok()
        .and_then(|parsed| extract_text(&parsed));

    Ok(match text {
        Some(text) => GenerationResponse::Text(text),
        None => GenerationResponse::Structured(raw),
    })
}

fn check_error_payload(raw: &serde_json::Value) -> Result<(), GenerationError> {
    let Some(error) = raw.get("error") else {
        return Ok(());
    };

    let body: ErrorBody = serde_json::from_value(error.clone()).unwrap_or_default();
    Err(GenerationError::Api {
        status: body.code.and_then(|code| u16::try_from(code).ok()),
        message: body.describe(&error.to_string()),
        retryable: false,
    })
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

impl GenerateContentRequest {
    fn from_request(request: &GenerationRequest) -> Result<Self, GenerationError> {
        let parts: Vec<Part> = request.parts().iter().map(Part::from_request_part).collect();

        if parts.is_empty() {
            return Err(GenerationError::EmptyRequest);
        }

        Ok(Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
        })
    }
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

impl Part {
    fn from_request_part(part: &RequestPart) -> Self {
        match part {
            RequestPart::Text(text) => Part::Text { text: text.clone() },
            RequestPart::InlineData { media_type, data } => Part::InlineData {
                inline_data: InlineDataPayload {
                    mime_type: media_type.clone(),
                    data: BASE64_STANDARD.encode(data),
                },
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    code: Option<i64>,
    message: Option<String>,
    status: Option<String>,
}

impl ErrorBody {
    fn describe(self, fallback: &str) -> String {
        let status_text = self.status.unwrap_or_default();
        let msg = self.message.unwrap_or_else(|| fallback.to_string());
        if status_text.is_empty() {
            msg
        } else {
            format!("{status_text}: {msg}")
        }
    }
}

/// Concatenates the non-thought text parts of the first candidate.
fn extract_text(response: &GenerateContentResponse) -> Option<String> {
    let candidate = response.candidates.as_ref()?.first()?;
    let content = candidate.content.as_ref()?;
    let text: String = content
        .parts
        .iter()
        .filter(|part| !part.thought)
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.is_empty() { None } else { Some(text) }
}

fn map_http_error(status: StatusCode, body: String) -> GenerationError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| wrapper.error.describe(&body))
        .unwrap_or_else(|_| body.clone());

    let retryable = matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    );

    GenerationError::Api {
        status: Some(status.as_u16()),
        message,
        retryable,
    }
}

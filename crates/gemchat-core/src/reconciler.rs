//! Response reconciliation.
//!
//! [`ResponseReconciler`] turns one user submission into exactly one
//! assistant message. Streaming is tried first; if it fails at any point the
//! partial text is discarded and a single synchronous call is made. If that
//! fails too, a sentinel error text becomes the assistant message, so the
//! transcript never ends with an unanswered user message.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::generation::{
    GenerationCapability, GenerationError, GenerationRequest, normalize_response, normalize_unit,
};
use crate::presentation::{Diagnostic, Presenter, STREAMING_CURSOR};
use crate::state::ChatState;
use crate::storage::{HISTORY_KEY, KeyValueStore};
use crate::transcript::{ConversationMessage, Transcript};

/// Fixed prefix of the assistant text stored when generation fails entirely.
pub const SENTINEL_MARKER: &str = "[error: unable to get model response]";

/// Builds the sentinel assistant text for a failure description.
pub fn sentinel_text(reason: &str) -> String {
    format!("{SENTINEL_MARKER} {reason}")
}

/// How the assistant text of one submission was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The streaming call completed.
    Streamed(String),
    /// Streaming failed and the synchronous call answered.
    Fallback(String),
    /// Both calls failed; holds the failure description.
    Failed(String),
}

impl GenerationOutcome {
    /// Text stored as the assistant message.
    pub fn content(&self) -> String {
        match self {
            GenerationOutcome::Streamed(text) | GenerationOutcome::Fallback(text) => text.clone(),
            GenerationOutcome::Failed(reason) => sentinel_text(reason),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, GenerationOutcome::Failed(_))
    }
}

/// Owns transcript mutation for submissions.
pub struct ResponseReconciler {
    capability: Arc<dyn GenerationCapability>,
    store: Arc<dyn KeyValueStore>,
    presenter: Arc<dyn Presenter>,
    history_key: String,
}

impl ResponseReconciler {
    pub fn new(
        capability: Arc<dyn GenerationCapability>,
        store: Arc<dyn KeyValueStore>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            capability,
            store,
            presenter,
            history_key: HISTORY_KEY.to_string(),
        }
    }

    /// Overrides the store key the transcript is written to.
    pub fn with_history_key(mut self, key: impl Into<String>) -> Self {
        self.history_key = key.into();
        self
    }

    pub fn model(&self) -> &str {
        self.capability.model()
    }

    /// Submits one user message.
    ///
    /// Records the user message before any network call, clears the pending
    /// attachments, appends exactly one assistant message and writes the
    /// transcript through to the store. Returns `None` without touching the
    /// state when there is neither text nor a pending attachment.
    pub async fn submit(
        &self,
        state: &mut ChatState,
        text: Option<&str>,
        send_attachment_payloads: bool,
    ) -> Option<GenerationOutcome> {
        let text = text.unwrap_or_default();
        if text.trim().is_empty() && state.pending.is_empty() {
            debug!("Ignoring empty submission");
            return None;
        }

        let attachments = state.pending.take();
        let request = GenerationRequest::build(text, &attachments, send_attachment_payloads);
        info!(
            model = self.capability.model(),
            attachments = attachments.len(),
            inline = request.inline_count(),
            "Submitting message"
        );

        let user_message = ConversationMessage::user(text, attachments);
        self.presenter.show_user(&user_message);
        state.transcript.push(user_message);
        self.persist(&state.transcript).await;

        let outcome = self.attempt_generation(&request).await;

        state
            .transcript
            .push(ConversationMessage::assistant(outcome.content()));
        self.persist(&state.transcript).await;

        Some(outcome)
    }

    /// Streams a reply, falling back to one synchronous call.
    ///
    /// Never returns an error: failures converge to [`GenerationOutcome::Failed`].
    pub async fn attempt_generation(&self, request: &GenerationRequest) -> GenerationOutcome {
        match self.stream_reply(request).await {
            Ok(text) => {
                self.presenter.show_final(&text);
                return GenerationOutcome::Streamed(text);
            }
            Err(err) => {
                warn!(error = %err, "Streaming failed, retrying without streaming");
            }
        }

        match self.capability.generate(request).await {
            Ok(response) => {
                let text = normalize_response(&response);
                self.presenter.show_final(&text);
                GenerationOutcome::Fallback(text)
            }
            Err(err) => {
                error!(error = %err, "Model call failed");
                self.presenter
                    .show_diagnostic(&Diagnostic::error(format!("Model call failed: {err}")));
                GenerationOutcome::Failed(err.to_string())
            }
        }
    }

    async fn stream_reply(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let mut stream = self.capability.generate_stream(request).await?;
        let mut accumulated = String::new();

        while let Some(unit) = stream.next().await {
            let unit = unit?;
            if let Some(fragment) = normalize_unit(&unit) {
                debug!(len = fragment.len(), "Received stream fragment");
                accumulated.push_str(&fragment);
            }
            self.presenter
                .show_partial(&format!("{accumulated}{STREAMING_CURSOR}"));
        }

        Ok(accumulated)
    }

    /// Best-effort write-through; failures are logged and swallowed.
    async fn persist(&self, transcript: &Transcript) {
        let json = match transcript.to_json() {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, "Failed to serialize transcript");
                return;
            }
        };

        if let Err(err) = self.store.write(&self.history_key, &json).await {
            warn!(error = %err, "Failed to persist transcript");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ChatError, Result};
    use crate::generation::{GenerationResponse, RequestPart, ResponseStream};
    use crate::transcript::{Attachment, MessageRole};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Unit = std::result::Result<GenerationResponse, GenerationError>;

    enum StreamPlan {
        Units(Vec<Unit>),
        OpenError(GenerationError),
    }

    struct MockCapability {
        stream: Mutex<Option<StreamPlan>>,
        sync: Mutex<Option<std::result::Result<GenerationResponse, GenerationError>>>,
        sync_calls: AtomicUsize,
        requests: Mutex<Vec<GenerationRequest>>,
    }

    impl MockCapability {
        fn new(stream: StreamPlan, sync: std::result::Result<GenerationResponse, GenerationError>) -> Self {
            Self {
                stream: Mutex::new(Some(stream)),
                sync: Mutex::new(Some(sync)),
                sync_calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn streaming(chunks: &[&str]) -> Self {
            let units = chunks
                .iter()
                .map(|chunk| Ok(GenerationResponse::text(*chunk)))
                .collect();
            Self::new(
                StreamPlan::Units(units),
                Err(GenerationError::transport("sync should not be called")),
            )
        }
    }

    #[async_trait]
    impl GenerationCapability for MockCapability {
        fn model(&self) -> &str {
            "mock-model"
        }

        async fn generate_stream(
            &self,
            request: &GenerationRequest,
        ) -> std::result::Result<ResponseStream, GenerationError> {
            self.requests.lock().unwrap().push(request.clone());
            match self.stream.lock().unwrap().take() {
                Some(StreamPlan::Units(units)) => Ok(futures::stream::iter(units).boxed()),
                Some(StreamPlan::OpenError(err)) => Err(err),
                None => Err(GenerationError::transport("stream already consumed")),
            }
        }

        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> std::result::Result<GenerationResponse, GenerationError> {
            self.sync_calls.fetch_add(1, Ordering::SeqCst);
            self.sync
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(GenerationError::transport("sync already consumed")))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        values: Mutex<HashMap<String, String>>,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStore for MemoryStore {
        async fn read(&self, key: &str) -> Result<Option<String>> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn write(&self, key: &str, value: &str) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl KeyValueStore for FailingStore {
        async fn read(&self, _key: &str) -> Result<Option<String>> {
            Err(ChatError::io("unavailable"))
        }

        async fn write(&self, _key: &str, _value: &str) -> Result<()> {
            Err(ChatError::io("disk full"))
        }
    }

    #[derive(Default)]
    struct RecordingPresenter {
        partials: Mutex<Vec<String>>,
        finals: Mutex<Vec<String>>,
        diagnostics: Mutex<Vec<Diagnostic>>,
    }

    impl Presenter for RecordingPresenter {
        fn show_user(&self, _message: &ConversationMessage) {}

        fn show_partial(&self, accumulated: &str) {
            self.partials.lock().unwrap().push(accumulated.to_string());
        }

        fn show_final(&self, text: &str) {
            self.finals.lock().unwrap().push(text.to_string());
        }

        fn show_diagnostic(&self, diagnostic: &Diagnostic) {
            self.diagnostics.lock().unwrap().push(diagnostic.clone());
        }
    }

    struct Harness {
        capability: Arc<MockCapability>,
        store: Arc<MemoryStore>,
        presenter: Arc<RecordingPresenter>,
        reconciler: ResponseReconciler,
    }

    fn harness(capability: MockCapability) -> Harness {
        let capability = Arc::new(capability);
        let store = Arc::new(MemoryStore::default());
        let presenter = Arc::new(RecordingPresenter::default());
        let reconciler = ResponseReconciler::new(
            capability.clone(),
            store.clone(),
            presenter.clone(),
        );
        Harness {
            capability,
            store,
            presenter,
            reconciler,
        }
    }

    fn last_text(state: &ChatState) -> String {
        state.transcript.last().unwrap().text()
    }

    #[tokio::test]
    async fn test_streamed_chunks_are_accumulated() {
        let h = harness(MockCapability::streaming(&["he", "llo"]));
        let mut state = ChatState::new();

        let outcome = h.reconciler.submit(&mut state, Some("hello"), false).await;

        assert_eq!(outcome, Some(GenerationOutcome::Streamed("hello".into())));
        let messages = state.transcript.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, MessageRole::User);
        assert_eq!(messages[0].text(), "hello");
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].text(), "hello");
        assert_eq!(h.capability.sync_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_partials_carry_cursor() {
        let h = harness(MockCapability::streaming(&["he", "llo"]));
        let mut state = ChatState::new();

        h.reconciler.submit(&mut state, Some("hello"), false).await;

        assert_eq!(
            *h.presenter.partials.lock().unwrap(),
            vec!["he▌".to_string(), "hello▌".to_string()]
        );
        assert_eq!(*h.presenter.finals.lock().unwrap(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_stream_open_failure_falls_back() {
        let h = harness(MockCapability::new(
            StreamPlan::OpenError(GenerationError::transport("ConnectionError")),
            Ok(GenerationResponse::text("hi there")),
        ));
        let mut state = ChatState::new();

        let outcome = h.reconciler.submit(&mut state, Some("hi"), false).await;

        assert_eq!(outcome, Some(GenerationOutcome::Fallback("hi there".into())));
        assert_eq!(last_text(&state), "hi there");
        assert_eq!(h.capability.sync_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_discards_partial_text() {
        let h = harness(MockCapability::new(
            StreamPlan::Units(vec![
                Ok(GenerationResponse::text("partial ")),
                Err(GenerationError::MalformedChunk("bad json".into())),
                Ok(GenerationResponse::text("never read")),
            ]),
            Ok(GenerationResponse::Structured(serde_json::json!({
                "candidates": [{"content": "complete answer"}]
            }))),
        ));
        let mut state = ChatState::new();

        h.reconciler.submit(&mut state, Some("hi"), false).await;

        assert_eq!(last_text(&state), "complete answer");
        assert_eq!(state.transcript.len(), 2);
    }

    #[tokio::test]
    async fn test_not_streamable_falls_back() {
        let h = harness(MockCapability::new(
            StreamPlan::OpenError(GenerationError::NotStreamable("application/json".into())),
            Ok(GenerationResponse::text("sync")),
        ));
        let mut state = ChatState::new();

        let outcome = h.reconciler.submit(&mut state, Some("hi"), false).await;

        assert_eq!(outcome, Some(GenerationOutcome::Fallback("sync".into())));
    }

    #[tokio::test]
    async fn test_double_failure_records_sentinel() {
        let h = harness(MockCapability::new(
            StreamPlan::OpenError(GenerationError::transport("ConnectionError")),
            Err(GenerationError::Api {
                status: Some(503),
                message: "overloaded".into(),
                retryable: true,
            }),
        ));
        let mut state = ChatState::new();

        let outcome = h.reconciler.submit(&mut state, Some("hi"), false).await;

        assert!(outcome.unwrap().is_failed());
        let content = last_text(&state);
        assert!(content.starts_with(SENTINEL_MARKER));
        assert!(content.contains("overloaded"));
        assert_eq!(state.transcript.len(), 2);
        assert_eq!(h.presenter.diagnostics.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_submission_is_noop() {
        let h = harness(MockCapability::streaming(&["x"]));
        let mut state = ChatState::new();

        assert_eq!(h.reconciler.submit(&mut state, None, false).await, None);
        assert_eq!(h.reconciler.submit(&mut state, Some("  "), false).await, None);

        assert!(state.transcript.is_empty());
        assert_eq!(h.store.writes.load(Ordering::SeqCst), 0);
        assert!(h.capability.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pending_cleared_on_failure() {
        let h = harness(MockCapability::new(
            StreamPlan::OpenError(GenerationError::transport("down")),
            Err(GenerationError::transport("still down")),
        ));
        let mut state = ChatState::new();
        state.pending.add(Attachment::with_payload("a.txt", vec![0; 10], None));

        h.reconciler.submit(&mut state, Some("see file"), true).await;

        assert!(state.pending.is_empty());
        assert_eq!(state.transcript.messages()[0].attachments.len(), 1);
    }

    #[tokio::test]
    async fn test_attachment_only_submission() {
        let h = harness(MockCapability::streaming(&["got it"]));
        let mut state = ChatState::new();
        state
            .pending
            .add(Attachment::with_payload("p.png", vec![1, 2], Some("image/png".into())));

        let outcome = h.reconciler.submit(&mut state, None, true).await;

        assert_eq!(outcome, Some(GenerationOutcome::Streamed("got it".into())));
        let requests = h.capability.requests.lock().unwrap();
        assert_eq!(
            requests[0].parts(),
            &[RequestPart::InlineData {
                media_type: "image/png".into(),
                data: vec![1, 2],
            }]
        );
    }

    #[tokio::test]
    async fn test_transcript_written_through() {
        let h = harness(MockCapability::streaming(&["ok"]));
        let mut state = ChatState::new();

        h.reconciler.submit(&mut state, Some("ping"), false).await;

        assert_eq!(h.store.writes.load(Ordering::SeqCst), 2);
        let stored = h.store.read(HISTORY_KEY).await.unwrap().unwrap();
        assert_eq!(Transcript::from_json(&stored).unwrap(), state.transcript);
    }

    #[tokio::test]
    async fn test_custom_history_key() {
        let h = harness(MockCapability::streaming(&["ok"]));
        let reconciler = ResponseReconciler::new(
            h.capability.clone(),
            h.store.clone(),
            h.presenter.clone(),
        )
        .with_history_key("custom");
        let mut state = ChatState::new();

        reconciler.submit(&mut state, Some("ping"), false).await;

        assert!(h.store.read("custom").await.unwrap().is_some());
        assert!(h.store.read(HISTORY_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persistence_failure_is_swallowed() {
        let capability = Arc::new(MockCapability::streaming(&["fine"]));
        let reconciler = ResponseReconciler::new(
            capability,
            Arc::new(FailingStore),
            Arc::new(crate::presentation::NullPresenter),
        );
        let mut state = ChatState::new();

        let outcome = reconciler.submit(&mut state, Some("hi"), false).await;

        assert_eq!(outcome, Some(GenerationOutcome::Streamed("fine".into())));
        assert_eq!(state.transcript.len(), 2);
    }

    #[tokio::test]
    async fn test_consecutive_submissions_stay_paired() {
        let h = harness(MockCapability::streaming(&["one"]));
        let mut state = ChatState::new();
        h.reconciler.submit(&mut state, Some("first"), false).await;

        let second = harness(MockCapability::streaming(&["two"]));
        second.reconciler.submit(&mut state, Some("second"), false).await;

        let roles: Vec<_> = state.transcript.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant
            ]
        );
    }
}

//! Chat use case.
//!
//! `ChatUseCase` owns the session state and coordinates the reconciler, the
//! key-value store and the presentation layer for everything the user can do
//! besides sending a message: entering a credential, picking a model,
//! managing attachments, clearing history and exporting/importing it.

use std::path::Path;
use std::sync::Arc;

use gemchat_core::config::AppConfig;
use gemchat_core::presentation::{Diagnostic, Presenter};
use gemchat_core::storage::KeyValueStore;
use gemchat_core::transcript::{Attachment, PendingAttachmentSet, Transcript};
use gemchat_core::{ChatError, ChatState, GenerationOutcome, ResponseReconciler, Result};
use gemchat_infrastructure::{CredentialSource, load_attachment, resolve_credential};
use gemchat_interaction::is_supported;
use tracing::{debug, info, warn};

use crate::capability_factory::CapabilityFactory;

const EMPTY_HISTORY: &str = "[]";

/// Application service for one chat session.
pub struct ChatUseCase {
    config: AppConfig,
    state: ChatState,
    store: Arc<dyn KeyValueStore>,
    presenter: Arc<dyn Presenter>,
    factory: Arc<dyn CapabilityFactory>,
    /// Present only while a capability is initialized.
    reconciler: Option<ResponseReconciler>,
    credential: Option<String>,
    /// Last credential written to the store.
    saved_credential: String,
    restored: bool,
}

impl ChatUseCase {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn KeyValueStore>,
        presenter: Arc<dyn Presenter>,
        factory: Arc<dyn CapabilityFactory>,
    ) -> Self {
        Self {
            config,
            state: ChatState::new(),
            store,
            presenter,
            factory,
            reconciler: None,
            credential: None,
            saved_credential: String::new(),
            restored: false,
        }
    }

    /// Restores the credential and history from the store, once.
    ///
    /// History is only restored into an empty transcript; unreadable history
    /// is ignored.
    pub async fn restore(&mut self) {
        if self.restored {
            return;
        }
        self.restored = true;

        match resolve_credential(&self.config, self.store.as_ref()).await {
            Some((credential, source)) => {
                debug!(?source, "Restored credential");
                if source == CredentialSource::Store {
                    self.saved_credential = credential.clone();
                }
                self.apply_credential(credential);
            }
            None => {
                self.presenter.show_diagnostic(&Diagnostic::info(format!(
                    "Enter a Gemini API key (/key <value>) or set {} to start chatting",
                    self.config.api_key_env
                )));
            }
        }

        let raw = match self.store.read(&self.config.storage.history_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(err) => {
                warn!(error = %err, "Failed to read stored history");
                return;
            }
        };

        match Transcript::from_json(&raw) {
            Ok(transcript) if self.state.transcript.is_empty() => {
                info!(messages = transcript.len(), "Restored history");
                self.state.transcript.replace(transcript);
            }
            Ok(_) => debug!("Transcript already populated, skipping restore"),
            Err(err) => debug!(error = %err, "Ignoring unreadable stored history"),
        }
    }

    /// Sets the credential, persisting it when it changed, and
    /// re-initializes the capability.
    pub async fn set_credential(&mut self, credential: &str) {
        if credential != self.saved_credential {
            self.write_store(&self.config.storage.credential_key, credential)
                .await;
            self.saved_credential = credential.to_string();
        }
        self.apply_credential(credential.to_string());
    }

    /// Selects one of the supported models and re-initializes the capability.
    pub fn select_model(&mut self, model: &str) -> Result<()> {
        if !is_supported(model) {
            return Err(ChatError::config(format!("unsupported model '{model}'")));
        }
        self.config.model = model.to_string();
        if let Some(credential) = self.credential.clone() {
            self.apply_credential(credential);
        }
        Ok(())
    }

    pub fn set_send_file_contents(&mut self, enabled: bool) {
        self.config.send_file_contents = enabled;
    }

    /// Loads a file and adds it to the pending attachments.
    ///
    /// Returns `false` when an attachment with the same name and size is
    /// already pending.
    pub async fn attach_file(&mut self, path: &Path) -> Result<bool> {
        let attachment = load_attachment(path).await.inspect_err(|err| {
            self.presenter
                .show_diagnostic(&Diagnostic::error(format!("Failed to read {}: {err}", path.display())));
        })?;
        Ok(self.add_attachment(attachment))
    }

    pub fn add_attachment(&mut self, attachment: Attachment) -> bool {
        let name = attachment.name.clone();
        let added = self.state.pending.add(attachment);
        if added {
            self.presenter
                .show_diagnostic(&Diagnostic::success(format!("Attached: {name}")));
        } else {
            self.presenter
                .show_diagnostic(&Diagnostic::info(format!("{name} is already attached")));
        }
        added
    }

    pub fn clear_pending(&mut self) {
        self.state.pending.clear();
    }

    /// Sends a message through the reconciler.
    ///
    /// Fails without recording anything when no capability is initialized.
    pub async fn submit(&mut self, text: &str) -> Result<Option<GenerationOutcome>> {
        let Some(reconciler) = self.reconciler.as_ref() else {
            self.presenter.show_diagnostic(&Diagnostic::error(
                "The model is not initialized; set an API key first",
            ));
            return Err(ChatError::Security("no usable credential".into()));
        };

        Ok(reconciler
            .submit(&mut self.state, Some(text), self.config.send_file_contents)
            .await)
    }

    /// Clears the transcript, the pending attachments and the stored copies.
    pub async fn clear_all(&mut self) {
        self.state.reset();
        self.clear_store().await;
    }

    /// Clears the stored history and credential, keeping the current session.
    pub async fn clear_local_cache(&mut self) {
        self.clear_store().await;
        self.presenter.show_diagnostic(&Diagnostic::success(
            "Local cache cleared; history will not be restored on next start",
        ));
    }

    /// Indented JSON of the whole transcript.
    pub fn export_json(&self) -> Result<String> {
        self.state.transcript.to_json_pretty()
    }

    pub async fn export_to_file(&self, path: &Path) -> Result<()> {
        let json = self.export_json()?;
        tokio::fs::write(path, json).await?;
        self.presenter.show_diagnostic(&Diagnostic::success(format!(
            "Exported {} messages to {}",
            self.state.transcript.len(),
            path.display()
        )));
        Ok(())
    }

    /// Replaces the transcript with imported JSON and persists it.
    ///
    /// Anything other than a list of messages is rejected and the transcript
    /// is left unchanged.
    pub async fn import_json(&mut self, raw: &str) -> Result<()> {
        let transcript = Transcript::from_json(raw).inspect_err(|err| {
            self.presenter
                .show_diagnostic(&Diagnostic::error(format!("Import failed: {err}")));
        })?;

        self.state.transcript.replace(transcript);
        match self.state.transcript.to_json() {
            Ok(json) => {
                self.write_store(&self.config.storage.history_key, &json)
                    .await
            }
            Err(err) => warn!(error = %err, "Failed to serialize imported history"),
        }

        self.presenter.show_diagnostic(&Diagnostic::success(format!(
            "Imported {} messages",
            self.state.transcript.len()
        )));
        Ok(())
    }

    pub async fn import_from_file(&mut self, path: &Path) -> Result<()> {
        let raw = tokio::fs::read_to_string(path).await.inspect_err(|err| {
            self.presenter
                .show_diagnostic(&Diagnostic::error(format!("Import failed: {err}")));
        })?;
        self.import_json(&raw).await
    }

    pub fn is_ready(&self) -> bool {
        self.reconciler.is_some()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn transcript(&self) -> &Transcript {
        &self.state.transcript
    }

    pub fn pending(&self) -> &PendingAttachmentSet {
        &self.state.pending
    }

    fn apply_credential(&mut self, credential: String) {
        if credential.trim().is_empty() {
            self.credential = None;
            self.reconciler = None;
            return;
        }

        match self.factory.create(&credential, &self.config) {
            Ok(capability) => {
                info!(model = capability.model(), "Generation capability ready");
                self.reconciler = Some(
                    ResponseReconciler::new(capability, self.store.clone(), self.presenter.clone())
                        .with_history_key(self.config.storage.history_key.clone()),
                );
            }
            Err(err) => {
                warn!(error = %err, "Failed to initialize generation capability");
                self.presenter.show_diagnostic(&Diagnostic::error(format!(
                    "Unable to initialize model: {err}"
                )));
                self.reconciler = None;
            }
        }
        self.credential = Some(credential);
    }

    async fn clear_store(&mut self) {
        self.write_store(&self.config.storage.history_key, EMPTY_HISTORY)
            .await;
        self.write_store(&self.config.storage.credential_key, "")
            .await;
        self.saved_credential.clear();
    }

    /// Best-effort store write; failures are logged and swallowed.
    async fn write_store(&self, key: &str, value: &str) {
        if let Err(err) = self.store.write(key, value).await {
            warn!(key, error = %err, "Failed to write to store");
        }
    }
}

use crate::llm::LlmClient;
use crate::prompt::{PromptEnvelope, DEFAULT_SYSTEM_PROMPT};
use docchat_core::{ChatError, DocumentContext, ExportError, LoadError, Turn};
use docchat_loader::DocumentLoader;
use docchat_session::{
    MemorySessionStore, PairingMode, Session, SessionRef, SessionStore, Transcript,
    TranscriptExporter,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Owns the session histories and the active document, and runs chat turns.
///
/// Every method takes `&self`; share the manager behind an `Arc`.
///
/// - Chats on one session are serialised by that session's lock, so history
///   order is completion order.
/// - A chat snapshots the document once, so a concurrent load is either fully
///   visible to it or not at all.
/// - A failed load or a failed chat leaves all state untouched.
pub struct SessionContextManager {
    llm: LlmClient,
    loader: DocumentLoader,
    sessions: Arc<dyn SessionStore>,
    document: RwLock<Option<Arc<DocumentContext>>>,
    system_prompt: String,
    request_timeout: Duration,
}

impl SessionContextManager {
    pub fn new(llm: LlmClient, loader: DocumentLoader) -> Self {
        Self {
            llm,
            loader,
            sessions: Arc::new(MemorySessionStore::new()),
            document: RwLock::new(None),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    // --- Sessions ---

    /// Ensure a history exists for `key`. Idempotent.
    pub async fn start_session(&self, key: &str) -> SessionRef {
        self.sessions.get_or_create(key).await
    }

    /// Snapshot of the turns recorded for `key`; empty for unknown keys.
    pub async fn history(&self, key: &str) -> Vec<Turn> {
        match self.sessions.get(key).await {
            Some(session) => session.lock().await.turns().to_vec(),
            None => Vec::new(),
        }
    }

    pub async fn session_keys(&self) -> Vec<String> {
        self.sessions.list().await
    }

    // --- Document context ---

    /// Parse `path` and make it the active document. On failure the previous
    /// document stays active.
    pub async fn load_document(&self, path: &Path) -> Result<Arc<DocumentContext>, LoadError> {
        let loaded = match self.loader.load(path).await {
            Ok(ctx) => Arc::new(ctx),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Document load failed, keeping previous context"
                );
                return Err(e);
            }
        };

        *self.document.write().await = Some(Arc::clone(&loaded));
        info!(
            path = %loaded.source_path.display(),
            format = %loaded.format,
            chars = loaded.char_count(),
            "Document context replaced"
        );
        Ok(loaded)
    }

    pub async fn document(&self) -> Option<Arc<DocumentContext>> {
        self.document.read().await.clone()
    }

    pub async fn document_text(&self) -> Option<String> {
        self.document
            .read()
            .await
            .as_ref()
            .map(|doc| doc.content.clone())
    }

    /// Unload the active document. Returns whether one was loaded.
    pub async fn clear_document(&self) -> bool {
        let previous = self.document.write().await.take();
        if let Some(doc) = &previous {
            info!(path = %doc.source_path.display(), "Document context cleared");
        }
        previous.is_some()
    }

    // --- Chat ---

    /// The prompt `chat` would send for `input` on session `key` right now.
    /// Does not create the session.
    pub async fn compose_envelope(&self, key: &str, input: &str) -> PromptEnvelope {
        let history = match self.sessions.get(key).await {
            Some(session) => session.lock().await.turns().to_vec(),
            None => Vec::new(),
        };
        self.envelope_for(history, input).await
    }

    async fn envelope_for(&self, history: Vec<Turn>, input: &str) -> PromptEnvelope {
        let document = self.document().await;
        PromptEnvelope::compose(
            self.system_prompt.as_str(),
            history,
            document.as_deref(),
            input,
        )
    }

    /// Run one chat turn on session `key`.
    ///
    /// `input` is forwarded as given, blank or not. The document text goes to
    /// the model only; history records the raw input. History grows by
    /// exactly two turns on success and is unchanged on any error.
    pub async fn chat(&self, key: &str, input: &str) -> Result<String, ChatError> {
        let session = self.start_session(key).await;
        let mut session = session.lock().await;
        let envelope = self.envelope_for(session.turns().to_vec(), input).await;

        let answer = match tokio::time::timeout(self.request_timeout, self.llm.complete(&envelope))
            .await
        {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!(session = %key, error = %e, "Model call failed");
                return Err(ChatError::ModelUnavailable(e.to_string()));
            }
            Err(_) => {
                warn!(
                    session = %key,
                    timeout_secs = self.request_timeout.as_secs(),
                    "Model call timed out"
                );
                return Err(ChatError::Timeout {
                    secs: self.request_timeout.as_secs(),
                });
            }
        };

        session.add_exchange(input, answer.as_str());
        info!(session = %key, turns = session.turn_count(), "Chat turn completed");
        Ok(answer)
    }

    // --- Export ---

    /// Write the transcript of `key` to `path`. An unknown key exports an
    /// empty transcript.
    pub async fn export_transcript(
        &self,
        key: &str,
        path: &Path,
        mode: PairingMode,
    ) -> Result<Transcript, ExportError> {
        let exporter = TranscriptExporter::new(mode);
        match self.sessions.get(key).await {
            Some(session) => exporter.export(&*session.lock().await, path).await,
            None => exporter.export(&Session::new(key), path).await,
        }
    }
}

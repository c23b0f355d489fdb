//! Application state for the DocuScope server

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::{ollama_providers, EmbeddingProvider, LlmProvider};
use crate::session::{Session, SessionInfo};

/// A session shared between requests; requests on one session run one at a time
pub type SharedSession = Arc<Mutex<Session>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Embedding provider shared by every session
    embedding_provider: Arc<dyn EmbeddingProvider>,
    /// LLM provider shared by every session
    llm_provider: Arc<dyn LlmProvider>,
    /// Live sessions
    sessions: DashMap<Uuid, SharedSession>,
    /// Result of the last readiness probe
    ready: RwLock<bool>,
}

impl AppState {
    /// Create state backed by the Ollama server in `config.llm`
    pub fn new(config: RagConfig) -> Result<Self> {
        let (embedder, llm) = ollama_providers(&config.llm, &config.embeddings)?;
        tracing::info!(
            "Ollama providers configured at {} (embedding: {}, generation: {})",
            config.llm.base_url,
            config.llm.embed_model,
            config.llm.generate_model
        );
        Ok(Self::with_providers(config, embedder, llm))
    }

    /// Create state with explicit providers
    pub fn with_providers(
        config: RagConfig,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        llm_provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                embedding_provider,
                llm_provider,
                sessions: DashMap::new(),
                ready: RwLock::new(false),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get the embedding provider
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedding_provider
    }

    /// Get the LLM provider
    pub fn llm_provider(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm_provider
    }

    /// Probe both providers and remember the result
    pub async fn check_ready(&self) -> bool {
        let (embedder, llm) = tokio::join!(
            self.inner.embedding_provider.health_check(),
            self.inner.llm_provider.health_check()
        );
        let ready = matches!(embedder, Ok(true)) && matches!(llm, Ok(true));
        *self.inner.ready.write() = ready;
        ready
    }

    /// Result of the last readiness probe
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Create and initialize a session. Nothing is stored if the models
    /// are unavailable.
    pub async fn create_session(&self) -> Result<SessionInfo> {
        let mut session = Session::new(
            &self.inner.config,
            Arc::clone(&self.inner.embedding_provider),
            Arc::clone(&self.inner.llm_provider),
        );
        session.initialize().await?;

        let info = session.info();
        self.inner
            .sessions
            .insert(info.id, Arc::new(Mutex::new(session)));
        tracing::info!("Created session {} ({} active)", info.id, self.session_count());
        Ok(info)
    }

    /// Look up a session
    pub fn session(&self, id: &Uuid) -> Result<SharedSession> {
        self.inner
            .sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Drop a session and its index
    pub fn remove_session(&self, id: &Uuid) -> Result<()> {
        self.inner
            .sessions
            .remove(id)
            .map(|_| tracing::info!("Removed session {}", id))
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// Number of live sessions
    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }
}

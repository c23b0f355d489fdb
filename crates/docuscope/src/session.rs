//! Session orchestration: model readiness, document loading, question answering
//!
//! A [`Session`] owns at most one loaded document and its vector index.
//! Loading a document builds a fresh index off to the side and swaps it in
//! only when every step succeeded, so a failed load never disturbs what was
//! loaded before.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::AnswerGenerator;
use crate::ingestion::{DocumentIngestor, IngestedDocument};
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::retrieval::{Retriever, SearchResult, VectorIndex};
use crate::types::{Answer, Document, DocumentSummary, QueryRequest};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Models not yet probed, or the last probe failed
    Uninitialized,
    /// Both models answered the readiness probe
    ModelsReady,
    /// A document is indexed and questions can be asked
    DocumentLoaded,
    /// A question is in flight
    AnsweringQuestion,
}

/// Serializable snapshot of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Session ID
    pub id: Uuid,
    /// Current state
    pub state: SessionState,
    /// Loaded document, if any
    pub document: Option<DocumentSummary>,
    /// Embedding model
    pub embedding_model: String,
    /// Generation model
    pub generation_model: String,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}

struct LoadedDocument {
    document: Document,
    index: VectorIndex,
}

/// Resets the state to `DocumentLoaded` when a question finishes, fails,
/// or is cancelled by dropping its future
struct AnsweringGuard<'a> {
    state: &'a mut SessionState,
}

impl<'a> AnsweringGuard<'a> {
    fn enter(state: &'a mut SessionState) -> Self {
        *state = SessionState::AnsweringQuestion;
        Self { state }
    }
}

impl Drop for AnsweringGuard<'_> {
    fn drop(&mut self) {
        *self.state = SessionState::DocumentLoaded;
    }
}

/// One user's conversation with one document at a time
pub struct Session {
    id: Uuid,
    created_at: chrono::DateTime<chrono::Utc>,
    dimensions: usize,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    ingestor: DocumentIngestor,
    retriever: Retriever,
    generator: AnswerGenerator,
    state: SessionState,
    loaded: Option<LoadedDocument>,
}

impl Session {
    /// Create an uninitialized session
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            dimensions: config.embeddings.dimensions,
            ingestor: DocumentIngestor::from_config(config),
            retriever: Retriever::new(Arc::clone(&embedder), config.retrieval.top_k),
            generator: AnswerGenerator::new(Arc::clone(&llm), config.llm.max_context_chars),
            embedder,
            llm,
            state: SessionState::Uninitialized,
            loaded: None,
        }
    }

    /// Session ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The loaded document, if any
    pub fn document(&self) -> Option<&Document> {
        self.loaded.as_ref().map(|l| &l.document)
    }

    /// The loaded document's index, if any
    pub fn index(&self) -> Option<&VectorIndex> {
        self.loaded.as_ref().map(|l| &l.index)
    }

    /// Snapshot for display or serialization
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            state: self.state,
            document: self.document().map(DocumentSummary::from),
            embedding_model: self.embedder.model().to_string(),
            generation_model: self.llm.model().to_string(),
            created_at: self.created_at,
        }
    }

    /// Probe both models. The session becomes `ModelsReady` only if both
    /// answer; otherwise it stays `Uninitialized`.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.state != SessionState::Uninitialized {
            return Ok(());
        }
        if self.embedder.dimensions() != self.dimensions {
            return Err(Error::Config(format!(
                "embedding model {} produces {}-dimensional vectors but embeddings.dimensions is {}",
                self.embedder.model(),
                self.embedder.dimensions(),
                self.dimensions
            )));
        }

        let (embedder_ok, llm_ok) =
            tokio::join!(self.embedder.health_check(), self.llm.health_check());

        let mut failures = Vec::new();
        if !matches!(embedder_ok, Ok(true)) {
            failures.push(format!(
                "embedding model {} ({})",
                self.embedder.model(),
                self.embedder.name()
            ));
        }
        if !matches!(llm_ok, Ok(true)) {
            failures.push(format!("generation model {} ({})", self.llm.model(), self.llm.name()));
        }

        if !failures.is_empty() {
            return Err(Error::ModelsUnavailable(failures.join(", ")));
        }

        self.state = SessionState::ModelsReady;
        tracing::info!(
            "Session {} ready (embedding: {}, generation: {})",
            self.id,
            self.embedder.model(),
            self.llm.model()
        );
        Ok(())
    }

    fn ensure_models_ready(&self) -> Result<()> {
        match self.state {
            SessionState::ModelsReady | SessionState::DocumentLoaded => Ok(()),
            _ => Err(Error::ModelsNotReady),
        }
    }

    /// Load a CSV or PDF file from disk, replacing any loaded document
    pub async fn load_document(&mut self, path: impl AsRef<Path>) -> Result<DocumentSummary> {
        self.ensure_models_ready()?;

        let path: PathBuf = path.as_ref().to_path_buf();
        tracing::info!("Loading {}", path.display());

        let ingestor = self.ingestor.clone();
        let parse_path = path.clone();
        let ingested = tokio::task::spawn_blocking(move || ingestor.ingest(&parse_path))
            .await
            .map_err(|e| Error::internal(format!("document parser task failed: {}", e)))??;

        self.index_and_swap(ingested, &path).await
    }

    /// Load an in-memory CSV or PDF file, replacing any loaded document
    pub async fn load_bytes(&mut self, filename: &str, data: Vec<u8>) -> Result<DocumentSummary> {
        self.ensure_models_ready()?;

        tracing::info!("Loading {} ({} bytes)", filename, data.len());

        let ingestor = self.ingestor.clone();
        let name = filename.to_string();
        let ingested = tokio::task::spawn_blocking(move || ingestor.ingest_bytes(&name, &data))
            .await
            .map_err(|e| Error::internal(format!("document parser task failed: {}", e)))??;

        self.index_and_swap(ingested, Path::new(filename)).await
    }

    /// Chunk, embed, and index a parsed document into a fresh index; install
    /// it only if every step succeeds
    async fn index_and_swap(
        &mut self,
        ingested: IngestedDocument,
        origin: &Path,
    ) -> Result<DocumentSummary> {
        let start = Instant::now();
        let chunks = self.ingestor.create_chunks(&ingested);
        if chunks.is_empty() {
            return Err(Error::empty_document(origin));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut index = VectorIndex::new(self.dimensions);
        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            index.insert(chunk.with_embedding(embedding))?;
        }

        let mut document = ingested.document;
        document.total_chunks = index.len() as u32;

        if let Some(previous) = &self.loaded {
            tracing::info!("Replacing {}", previous.document.filename);
        }
        tracing::info!(
            "Loaded {}: {} segments, {} chunks in {:?}",
            document.filename,
            document.total_segments,
            document.total_chunks,
            start.elapsed()
        );

        let summary = DocumentSummary::from(&document);
        self.loaded = Some(LoadedDocument { document, index });
        self.state = SessionState::DocumentLoaded;
        Ok(summary)
    }

    /// Retrieve the chunks most relevant to `question` without generating
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        let loaded = self.loaded.as_ref().ok_or(Error::NoDocumentLoaded)?;
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }
        self.retriever.retrieve(&loaded.index, question).await
    }

    /// Answer a question about the loaded document
    pub async fn ask(&mut self, question: &str) -> Result<Answer> {
        self.query(&QueryRequest::new(question)).await
    }

    /// Answer a question with per-request options
    pub async fn query(&mut self, request: &QueryRequest) -> Result<Answer> {
        let loaded = self.loaded.as_ref().ok_or(Error::NoDocumentLoaded)?;
        let question = request.question.trim();
        if question.is_empty() {
            return Err(Error::EmptyQuestion);
        }
        let k = match request.top_k {
            Some(0) => return Err(Error::InvalidRequest("top_k must be at least 1".into())),
            Some(k) => k,
            None => self.retriever.top_k(),
        };

        let start = Instant::now();
        let _guard = AnsweringGuard::enter(&mut self.state);

        let results = self.retriever.retrieve_k(&loaded.index, question, k).await?;
        let answer_text = self.generator.generate(question, &results).await?;

        let answer = Answer::new(answer_text, &results, start.elapsed().as_millis() as u64);
        tracing::info!(
            "Answered question in {}ms from {} chunks",
            answer.processing_time_ms,
            answer.sources.len()
        );
        Ok(answer)
    }
}

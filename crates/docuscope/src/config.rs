//! Configuration for DocuScope

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Prompt characters budgeted per retrieved chunk beyond its text: the
/// numbered reference line and the separator
pub const CONTEXT_ENTRY_OVERHEAD: usize = 64;

/// Upper bound for `llm.max_retries`; backoff doubles per attempt
pub const MAX_RETRIES: u32 = 10;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Document loading configuration
    pub ingestion: IngestionConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Ollama/LLM configuration
    pub llm: LlmConfig,
}

impl RagConfig {
    /// Read a TOML configuration file. Missing sections and keys fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Invalid {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, else the user config file if it exists, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/docuscope/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docuscope").join("config.toml"))
    }

    /// Reject values the pipeline cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be greater than 0".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be at least 1".into()));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embeddings.dimensions must be greater than 0".into()));
        }
        if self.ingestion.rows_per_segment == 0 {
            return Err(Error::Config("ingestion.rows_per_segment must be at least 1".into()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::Config(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.max_context_chars == 0 {
            return Err(Error::Config("llm.max_context_chars must be greater than 0".into()));
        }
        let needed = self
            .retrieval
            .top_k
            .saturating_mul(self.chunking.chunk_size.saturating_add(CONTEXT_ENTRY_OVERHEAD));
        if needed > self.llm.max_context_chars {
            return Err(Error::Config(format!(
                "retrieval.top_k ({}) chunks of up to {} chars need about {} context chars, \
                 but llm.max_context_chars is {}; raise it or lower top_k/chunk_size",
                self.retrieval.top_k, self.chunking.chunk_size, needed, self.llm.max_context_chars
            )));
        }
        if self.llm.max_retries > MAX_RETRIES {
            return Err(Error::Config(format!(
                "llm.max_retries must be at most {}, got {}",
                MAX_RETRIES, self.llm.max_retries
            )));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding dimensions (1024 for mxbai-embed-large, 768 for nomic-embed-text)
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { dimensions: 1024 }
    }
}

/// Text chunking configuration. Lengths are counted in `char`s.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters repeated from the end of one chunk at the start of the next
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 0,
        }
    }
}

/// What to do when a single PDF page fails text extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFailurePolicy {
    /// Log a warning and continue with the remaining pages
    #[default]
    Skip,
    /// Fail the whole load
    Abort,
}

/// Document loading configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// CSV data rows grouped into one text segment
    pub rows_per_segment: usize,
    /// Handling of PDF pages whose text cannot be extracted
    pub pdf_page_failure: PageFailurePolicy,
    /// Upper bound for the whole-document PDF extraction pass
    pub pdf_extract_timeout_secs: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            rows_per_segment: 1,
            pdf_page_failure: PageFailurePolicy::Skip,
            pdf_extract_timeout_secs: 60,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the generator
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Sampling temperature. Answers vary between calls unless this is 0.0;
    /// that variation is expected model behaviour.
    pub temperature: f32,
    /// Request timeout in seconds; expiry counts as the service being unavailable
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Upper bound on the document context placed in the prompt
    pub max_context_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "mxbai-embed-large".to_string(),
            generate_model: "llama3.2:3b".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
            max_retries: 2,
            max_context_chars: 6000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.chunking.chunk_overlap, 0);
        assert_eq!(config.ingestion.pdf_page_failure, PageFailurePolicy::Skip);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RagConfig = toml::from_str(
            r#"
            [retrieval]
            top_k = 2

            [llm]
            generate_model = "llama3.2:1b"
            temperature = 0.3

            [ingestion]
            pdf_page_failure = "abort"
            "#,
        )
        .unwrap();

        assert_eq!(config.retrieval.top_k, 2);
        assert_eq!(config.llm.generate_model, "llama3.2:1b");
        assert_eq!(config.llm.embed_model, "mxbai-embed-large");
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.ingestion.pdf_page_failure, PageFailurePolicy::Abort);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut config = RagConfig::default();
        config.chunking.chunk_size = 100;
        config.chunking.chunk_overlap = 100;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let mut config = RagConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_context_budget_must_fit_top_k_chunks() {
        assert!(RagConfig::default().validate().is_ok());

        let mut config = RagConfig::default();
        config.retrieval.top_k = 8;
        match config.validate() {
            Err(Error::Config(message)) => assert!(message.contains("max_context_chars")),
            other => panic!("expected Config error, got {:?}", other),
        }

        config.llm.max_context_chars = 8 * (1000 + CONTEXT_ENTRY_OVERHEAD);
        assert!(config.validate().is_ok());

        config.retrieval.top_k = usize::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_retries_bounded() {
        let mut config = RagConfig::default();
        config.llm.max_retries = MAX_RETRIES;
        assert!(config.validate().is_ok());

        config.llm.max_retries = 64;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chunking]\nchunk_size = 300\nchunk_overlap = 30\n").unwrap();

        let config = RagConfig::from_file(&path).unwrap();
        assert_eq!(config.chunking.chunk_size, 300);
        assert_eq!(config.chunking.chunk_overlap, 30);
    }
}

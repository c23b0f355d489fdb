//! Provider abstractions for embeddings and LLM generation
//!
//! The session talks to these traits only, so tests can swap in
//! deterministic fakes for the Ollama-backed implementations.

pub mod embedding;
pub mod llm;
pub mod ollama;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use ollama::{ollama_providers, OllamaClient, OllamaEmbedder, OllamaLlm};

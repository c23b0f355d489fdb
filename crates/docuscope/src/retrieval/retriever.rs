//! Query-time retrieval: embed the question, search the index

use std::sync::Arc;

use crate::error::Result;
use crate::providers::EmbeddingProvider;

use super::index::{SearchResult, VectorIndex};

/// Top-k cosine retriever over a document's index
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    /// Create a retriever returning `top_k` results by default
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self { embedder, top_k }
    }

    /// Default number of results
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve the configured number of chunks most similar to `question`
    pub async fn retrieve(&self, index: &VectorIndex, question: &str) -> Result<Vec<SearchResult>> {
        self.retrieve_k(index, question, self.top_k).await
    }

    /// Retrieve with an explicit `k`
    pub async fn retrieve_k(
        &self,
        index: &VectorIndex,
        question: &str,
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed(question).await?;
        let results = index.query(&query_embedding, k)?;

        tracing::debug!(
            "Retrieved {} of {} chunks (best similarity {:.3})",
            results.len(),
            index.len(),
            results.first().map(|r| r.similarity).unwrap_or(0.0)
        );

        Ok(results)
    }
}

//! In-memory exhaustive cosine index

use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::Chunk;

/// Search result with chunk and similarity
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Cosine similarity to the query (-1.0..=1.0, higher is better)
    pub similarity: f32,
}

/// Vector index over the chunks of one document.
///
/// Chunks keep their insertion order, which breaks ties between equal
/// scores. Embeddings are fixed at insertion; there is no update or delete.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimensions: usize,
    chunks: Vec<Chunk>,
    positions: HashMap<Uuid, usize>,
    /// Cached L2 norm per chunk
    norms: Vec<f32>,
}

impl VectorIndex {
    /// Create an empty index for vectors of `dimensions` components
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            chunks: Vec::new(),
            positions: HashMap::new(),
            norms: Vec::new(),
        }
    }

    /// Embedding dimensionality accepted by this index
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of stored chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Check whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Look up a chunk by ID
    pub fn get(&self, id: &Uuid) -> Option<&Chunk> {
        self.positions.get(id).map(|&pos| &self.chunks[pos])
    }

    /// Iterate chunks in insertion order
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    /// Insert an embedded chunk
    pub fn insert(&mut self, chunk: Chunk) -> Result<Uuid> {
        if chunk.embedding.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: chunk.embedding.len(),
            });
        }
        if self.positions.contains_key(&chunk.id) {
            return Err(Error::VectorIndex(format!("duplicate chunk id {}", chunk.id)));
        }

        let id = chunk.id;
        self.positions.insert(id, self.chunks.len());
        self.norms.push(norm(&chunk.embedding));
        self.chunks.push(chunk);
        Ok(id)
    }

    /// Return the `k` chunks most similar to `vector`, best first
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if vector.len() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        if k == 0 || self.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let query_norm = norm(vector);
        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .zip(&self.norms)
            .enumerate()
            .map(|(i, (chunk, &chunk_norm))| {
                (i, cosine_similarity(vector, query_norm, &chunk.embedding, chunk_norm))
            })
            .collect();

        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, similarity)| SearchResult {
                chunk: self.chunks[i].clone(),
                similarity,
            })
            .collect())
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity from precomputed norms; 0.0 when either vector is zero
fn cosine_similarity(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let similarity = dot / (norm_a * norm_b);
    if similarity.is_nan() {
        0.0
    } else {
        similarity
    }
}

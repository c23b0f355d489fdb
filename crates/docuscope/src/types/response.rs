//! Response types for questions and document loads

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{format_reference, Document, FileType};
use crate::retrieval::SearchResult;

/// A retrieved chunk cited as evidence for an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Chunk ID
    pub chunk_id: Uuid,
    /// Chunk text
    pub text: String,
    /// Originating file name
    pub source_id: String,
    /// File type
    pub file_type: FileType,
    /// CSV row or PDF page
    pub position: u32,
    /// Chunk index within the row group or page
    pub part: u32,
    /// Cosine similarity to the question
    pub similarity: f32,
}

impl Source {
    /// Create a source from a search result
    pub fn from_result(result: &SearchResult) -> Self {
        let chunk = &result.chunk;
        Self {
            chunk_id: chunk.id,
            text: chunk.text.clone(),
            source_id: chunk.source.source_id.clone(),
            file_type: chunk.source.file_type,
            position: chunk.source.position,
            part: chunk.source.part,
            similarity: result.similarity,
        }
    }

    /// Reference in the same form as [`ChunkSource::reference`](super::document::ChunkSource::reference), e.g. `sales.csv, Row 3`
    pub fn reference(&self) -> String {
        format_reference(&self.source_id, self.file_type, self.position)
    }

    /// Format citation for display in text
    pub fn format_inline(&self) -> String {
        format!("[Source: {}]", self.reference())
    }

    /// Snippet for terminal display: trimmed and cut to `max_chars` characters
    pub fn snippet(&self, max_chars: usize) -> String {
        truncate_snippet(self.text.trim(), max_chars)
    }
}

/// Answer to a question, with the chunks it was conditioned on in retrieval order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Generated answer text
    pub answer_text: String,
    /// Evidence chunks, most similar first
    pub sources: Vec<Source>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl Answer {
    /// Create a new answer
    pub fn new(answer_text: String, results: &[SearchResult], processing_time_ms: u64) -> Self {
        Self {
            answer_text: answer_text.trim().to_string(),
            sources: results.iter().map(Source::from_result).collect(),
            processing_time_ms,
        }
    }

    /// Sources worth showing to a person: distinct texts longer than ten characters
    pub fn distinct_sources(&self) -> Vec<&Source> {
        let mut seen = std::collections::HashSet::new();
        self.sources
            .iter()
            .filter(|s| {
                let text = s.text.trim();
                text.chars().count() > 10 && seen.insert(text)
            })
            .collect()
    }
}

/// Document summary returned after a successful load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Document ID
    pub id: Uuid,
    /// File name
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// File size in bytes
    pub file_size: u64,
    /// SHA-256 of the file
    pub content_hash: String,
    /// CSV row groups or PDF pages with text
    pub total_segments: u32,
    /// Chunks stored in the index
    pub total_chunks: u32,
    /// PDF pages skipped because extraction failed
    pub skipped_pages: Vec<u32>,
    /// Load timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename.clone(),
            file_type: doc.file_type,
            file_size: doc.file_size,
            content_hash: doc.content_hash.clone(),
            total_segments: doc.total_segments,
            total_chunks: doc.total_chunks,
            skipped_pages: doc.skipped_pages.clone(),
            ingested_at: doc.ingested_at,
        }
    }
}

/// Truncate snippet to max characters, appending `...` when cut
pub fn truncate_snippet(snippet: &str, max_chars: usize) -> String {
    match snippet.char_indices().nth(max_chars) {
        None => snippet.to_string(),
        Some((byte_idx, _)) => {
            let truncated = &snippet[..byte_idx];
            // Try to break at word boundary
            let cut = match truncated.rfind(' ') {
                Some(pos) if pos > byte_idx / 2 => &truncated[..pos],
                _ => truncated,
            };
            format!("{}...", cut.trim_end())
        }
    }
}

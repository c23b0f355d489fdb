//! Document and chunk types with source tracking for citations

use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Comma-separated values with a header row
    Csv,
    /// PDF document with extractable text
    Pdf,
}

impl FileType {
    /// Detect file type from extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Detect file type from a path or file name
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Pdf => "PDF",
        }
    }

    /// Label for the `position` of a chunk in this kind of file
    pub fn position_label(&self) -> &'static str {
        match self {
            Self::Csv => "Row",
            Self::Pdf => "Page",
        }
    }
}

/// A document that has been loaded into a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// File name used as the source identifier of every chunk
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// SHA-256 of the raw file bytes
    pub content_hash: String,
    /// Text segments produced by the parser (CSV row groups or PDF pages)
    pub total_segments: u32,
    /// Chunks stored in the index
    pub total_chunks: u32,
    /// PDF pages skipped because extraction failed
    pub skipped_pages: Vec<u32>,
    /// File size in bytes
    pub file_size: u64,
    /// Load timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new document record
    pub fn new(filename: String, file_type: FileType, content_hash: String, file_size: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            file_type,
            content_hash,
            total_segments: 0,
            total_chunks: 0,
            skipped_pages: Vec::new(),
            file_size,
            ingested_at: chrono::Utc::now(),
        }
    }
}

/// `<file>, <Row|Page> <n>`
pub fn format_reference(source_id: &str, file_type: FileType, position: u32) -> String {
    format!("{}, {} {}", source_id, file_type.position_label(), position)
}

/// Source location of a chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSource {
    /// Originating file name
    pub source_id: String,
    /// File type
    pub file_type: FileType,
    /// 1-based CSV data row (first row of the group) or PDF page
    pub position: u32,
    /// 0-based index of the chunk within its segment
    pub part: u32,
}

impl ChunkSource {
    /// Create a source for the first chunk of a segment
    pub fn new(source_id: impl Into<String>, file_type: FileType, position: u32) -> Self {
        Self {
            source_id: source_id.into(),
            file_type,
            position,
            part: 0,
        }
    }

    /// Human-readable reference, e.g. `sales.csv, Row 3`
    pub fn reference(&self) -> String {
        format_reference(&self.source_id, self.file_type, self.position)
    }
}

/// A bounded span of document text with its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Chunk text, never empty
    pub text: String,
    /// Where the text came from
    pub source: ChunkSource,
    /// Embedding vector; empty until the chunk is embedded
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Create a chunk without an embedding
    pub fn new(text: String, source: ChunkSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            source,
            embedding: Vec::new(),
        }
    }

    /// Attach the embedding
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }
}

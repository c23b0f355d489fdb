//! Ingestion pipeline orchestration

use std::path::Path;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkSource, Document, FileType};

use super::chunker::TextChunker;
use super::parser::{FileParser, Segment};

/// A parsed document ready for chunking
#[derive(Debug, Clone)]
pub struct IngestedDocument {
    /// Document record
    pub document: Document,
    /// Segments in document order
    pub segments: Vec<Segment>,
}

/// Main ingestion pipeline: file checks, parsing, chunking
#[derive(Debug, Clone)]
pub struct DocumentIngestor {
    parser: FileParser,
    chunker: TextChunker,
}

impl DocumentIngestor {
    /// Create a new ingestion pipeline
    pub fn new(parser: FileParser, chunker: TextChunker) -> Self {
        Self { parser, chunker }
    }

    /// Build the pipeline from configuration
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(
            FileParser::new(config.ingestion.clone()),
            TextChunker::from_config(&config.chunking),
        )
    }

    /// Check that `path` names an existing regular file of a supported type,
    /// without reading it
    pub fn validate(path: &Path) -> Result<FileType> {
        if !path.exists() {
            return Err(Error::file_not_found(path));
        }
        if !path.is_file() {
            return Err(Error::unreadable(path, "not a regular file"));
        }
        FileType::from_path(path).ok_or_else(|| {
            Error::unsupported(path, "supported formats are CSV (.csv) and PDF (.pdf)")
        })
    }

    /// Read and parse a file from disk
    pub fn ingest(&self, path: &Path) -> Result<IngestedDocument> {
        Self::validate(path)?;

        let data = std::fs::read(path).map_err(|e| Error::unreadable(path, e.to_string()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        tracing::debug!("Read {} bytes from {}", data.len(), path.display());

        self.ingest_bytes(&filename, &data).map_err(|e| match e {
            // Report the full path rather than the bare file name
            Error::EmptyDocument(_) => Error::empty_document(path),
            Error::UnsupportedFormat { reason, .. } => Error::unsupported(path, reason),
            other => other,
        })
    }

    /// Parse an in-memory file, e.g. an upload
    pub fn ingest_bytes(&self, filename: &str, data: &[u8]) -> Result<IngestedDocument> {
        let parsed = self.parser.parse(filename, data)?;

        let mut document = Document::new(
            filename.to_string(),
            parsed.file_type,
            parsed.content_hash,
            data.len() as u64,
        );
        document.total_segments = parsed.segments.len() as u32;
        document.skipped_pages = parsed.skipped_pages;

        Ok(IngestedDocument {
            document,
            segments: parsed.segments,
        })
    }

    /// Split every segment into chunks, in document order
    pub fn create_chunks(&self, ingested: &IngestedDocument) -> Vec<Chunk> {
        let doc = &ingested.document;
        ingested
            .segments
            .iter()
            .flat_map(|segment| {
                let source = ChunkSource::new(doc.filename.clone(), doc.file_type, segment.position);
                self.chunker.chunk(&segment.text, source)
            })
            .collect()
    }
}

impl Default for DocumentIngestor {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

//! Core types for DocuScope

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, ChunkSource, Document, FileType};
pub use query::{is_exit_command, QueryRequest, EXIT_KEYWORDS};
pub use response::{Answer, DocumentSummary, Source};

//! Document ingestion: CSV/PDF parsing and chunking

mod chunker;
mod parser;
mod processor;

pub use chunker::{ChunkIter, TextChunker};
pub use parser::{FileParser, ParsedDocument, Segment};
pub use processor::{DocumentIngestor, IngestedDocument};

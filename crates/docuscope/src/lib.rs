//! docuscope: question answering over a single CSV or PDF document
//!
//! A document is parsed into segments (CSV row groups or PDF pages), split
//! into chunks, embedded through a local Ollama server, and held in an
//! in-memory cosine index. Questions are embedded the same way, the top-k
//! chunks are retrieved, and a generation model answers from them.
//!
//! [`session::Session`] drives the whole pipeline; the `docuscope` binary
//! wraps it in a terminal loop and `docuscope-server` exposes it over HTTP.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod interactive;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use session::{Session, SessionInfo, SessionState};
pub use types::{
    document::{Chunk, ChunkSource, Document, FileType},
    query::QueryRequest,
    response::{Answer, DocumentSummary, Source},
};

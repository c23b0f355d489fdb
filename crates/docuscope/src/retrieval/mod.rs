//! Vector index and retrieval

mod index;
mod retriever;

pub use index::{SearchResult, VectorIndex};
pub use retriever::Retriever;

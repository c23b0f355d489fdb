//! Error types for the DocuScope pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for DocuScope operations
pub type Result<T> = std::result::Result<T, Error>;

/// DocuScope errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad extension or content that cannot be parsed as the declared format
    #[error("Unsupported format for '{}': {reason}", .path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    /// Input path does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Input path exists but cannot be read as a regular file
    #[error("Cannot read '{}': {reason}", .path.display())]
    FileUnreadable { path: PathBuf, reason: String },

    /// Ingestion produced no chunks
    #[error("No text content found in '{}'", .0.display())]
    EmptyDocument(PathBuf),

    /// Embedding service could not produce a vector
    #[error("Embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Generation service could not produce an answer
    #[error("Generation service unavailable: {0}")]
    GenerationUnavailable(String),

    /// Readiness probe failed for one or more model providers
    #[error("Models unavailable: {0}")]
    ModelsUnavailable(String),

    /// A document was loaded before the models were initialized
    #[error("Models are not initialized; call initialize first")]
    ModelsNotReady,

    /// A question was asked before any successful load
    #[error("No document loaded; load a CSV or PDF file first")]
    NoDocumentLoaded,

    /// Blank question
    #[error("Question is empty")]
    EmptyQuestion,

    /// Vector dimensionality does not match the index
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vector index contract violation
    #[error("Vector index error: {0}")]
    VectorIndex(String),

    /// Malformed HTTP request (server)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upload body exceeds `server.max_upload_size` (server)
    #[error("Upload too large: {0}")]
    UploadTooLarge(String),

    /// Unknown session id (server)
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an unsupported format error
    pub fn unsupported(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl AsRef<Path>) -> Self {
        Self::FileNotFound(path.as_ref().to_path_buf())
    }

    /// Create a file unreadable error
    pub fn unreadable(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::FileUnreadable {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Create an empty document error
    pub fn empty_document(path: impl AsRef<Path>) -> Self {
        Self::EmptyDocument(path.as_ref().to_path_buf())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::GenerationUnavailable(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::UnsupportedFormat { .. } => "unsupported_format",
            Error::FileNotFound(_) => "file_not_found",
            Error::FileUnreadable { .. } => "file_unreadable",
            Error::EmptyDocument(_) => "empty_document",
            Error::EmbeddingUnavailable(_) => "embedding_unavailable",
            Error::GenerationUnavailable(_) => "generation_unavailable",
            Error::ModelsUnavailable(_) => "models_unavailable",
            Error::ModelsNotReady => "models_not_ready",
            Error::NoDocumentLoaded => "no_document_loaded",
            Error::EmptyQuestion => "empty_question",
            Error::DimensionMismatch { .. } => "dimension_mismatch",
            Error::VectorIndex(_) => "vector_index_error",
            Error::InvalidRequest(_) => "invalid_request",
            Error::UploadTooLarge(_) => "upload_too_large",
            Error::SessionNotFound(_) => "session_not_found",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// HTTP status used when the error crosses the server boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Config(_)
            | Error::EmptyQuestion
            | Error::InvalidRequest(_)
            | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::FileNotFound(_) | Error::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Error::FileUnreadable { .. } | Error::EmptyDocument(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::EmbeddingUnavailable(_)
            | Error::GenerationUnavailable(_)
            | Error::ModelsUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::ModelsNotReady | Error::NoDocumentLoaded => StatusCode::CONFLICT,
            Error::DimensionMismatch { .. }
            | Error::VectorIndex(_)
            | Error::Io(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

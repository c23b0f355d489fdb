//! API routes for the DocuScope server

pub mod query;
pub mod sessions;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        // Uploads get their own body limit
        .route(
            "/sessions/:id/document",
            post(sessions::upload_document).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/sessions/:id/query", post(query::query_session))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();
    Json(serde_json::json!({
        "name": "docuscope",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Question answering over a CSV or PDF document",
        "models": {
            "embedding": state.embedding_provider().model(),
            "generation": state.llm_provider().model(),
        },
        "retrieval": {
            "top_k": config.retrieval.top_k,
            "chunk_size": config.chunking.chunk_size,
            "chunk_overlap": config.chunking.chunk_overlap,
        },
        "ready": state.is_ready(),
        "active_sessions": state.session_count(),
        "endpoints": {
            "POST /api/sessions": "Create a session (probes the models)",
            "GET /api/sessions/:id": "Session state and loaded document",
            "DELETE /api/sessions/:id": "Discard a session",
            "POST /api/sessions/:id/document": "Upload a CSV or PDF file (multipart)",
            "POST /api/sessions/:id/query": "Ask a question: {question, top_k?}"
        }
    }))
}

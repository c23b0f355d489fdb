//! Question endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{Answer, QueryRequest};

/// POST /api/sessions/:id/query - Answer a question about the session's document
pub async fn query_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<Answer>> {
    let session = state.session(&id)?;

    tracing::info!("Query on session {}: \"{}\"", id, request.question);

    let answer = session.lock().await.query(&request).await?;
    Ok(Json(answer))
}

//! Session lifecycle and document upload endpoints

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::session::SessionInfo;
use crate::types::DocumentSummary;

/// POST /api/sessions - Create a session and probe the models
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionInfo>)> {
    let info = state.create_session().await?;
    Ok((StatusCode::CREATED, Json(info)))
}

/// GET /api/sessions/:id - Session state and loaded document
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionInfo>> {
    let session = state.session(&id)?;
    let info = session.lock().await.info();
    Ok(Json(info))
}

/// DELETE /api/sessions/:id - Discard a session
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.remove_session(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/sessions/:id/document - Upload a CSV or PDF file, replacing
/// the session's current document
pub async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<DocumentSummary>> {
    let session = state.session(&id)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error("failed to read multipart field", e))?
    {
        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| upload_error(&format!("failed to read {}", filename), e))?;
        upload = Some((filename, data.to_vec()));
        break;
    }

    let (filename, data) =
        upload.ok_or_else(|| Error::InvalidRequest("no file field in upload".to_string()))?;

    tracing::info!("Upload to session {}: {} ({} bytes)", id, filename, data.len());

    let summary = session.lock().await.load_bytes(&filename, data).await?;
    Ok(Json(summary))
}

/// Body-limit rejections become 413; anything else is a malformed request
fn upload_error(context: &str, e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::UploadTooLarge(format!("{}: {}", context, e.body_text()))
    } else {
        Error::InvalidRequest(format!("{}: {}", context, e.body_text()))
    }
}

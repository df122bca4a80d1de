use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::error;
use uuid::Uuid;

use kadra_db::StoreError;
use kadra_types::api::{Claims, UploadChatFileResponse};
use kadra_types::models::UserRole;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

/// 10 MB upload limit for chat attachments
const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub filename: String,
}

/// POST /applications/{id}/files — accepts raw bytes, saves under the
/// upload directory keyed by the generated file id, records the file as a
/// chat message.
pub async fn upload_chat_file(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
    Query(query): Query<UploadQuery>,
    Extension(claims): Extension<Claims>,
    headers: axum::http::HeaderMap,
    bytes: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("file is empty".into()));
    }
    if bytes.len() > MAX_FILE_SIZE {
        return Err(ApiError::BadRequest("file exceeds the 10 MB limit".into()));
    }
    let original_name = query.filename.trim();
    if original_name.is_empty() || original_name.contains('/') || original_name.contains("..") {
        return Err(ApiError::BadRequest("invalid filename".into()));
    }

    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let file_id = Uuid::new_v4().to_string();
    let size = bytes.len() as i64;

    tokio::fs::create_dir_all(&state.upload_dir).await.map_err(|e| {
        error!("Failed to create upload directory: {}", e);
        ApiError::Internal
    })?;

    let file_path = state.upload_dir.join(&file_id);
    let mut file = tokio::fs::File::create(&file_path).await.map_err(|e| {
        error!("Failed to create file {}: {}", file_path.display(), e);
        ApiError::Internal
    })?;
    file.write_all(&bytes).await.map_err(|e| {
        error!("Failed to write file {}: {}", file_path.display(), e);
        ApiError::Internal
    })?;

    let db = state.clone();
    let fid = file_id.clone();
    let sender_id = claims.sub.to_string();
    let name = original_name.to_string();
    let path = file_path.to_string_lossy().to_string();
    let result = run_blocking(move || {
        db.db
            .insert_chat_file(&fid, &application_id, &sender_id, &name, &path, size, mime_type.as_deref())
    })
    .await;

    let (message, file_row) = match result {
        Ok(pair) => pair,
        Err(err) => {
            // the chat rejected the upload; remove the orphaned blob
            let _ = tokio::fs::remove_file(&file_path).await;
            return Err(err);
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(UploadChatFileResponse {
            success: true,
            message_id: message.id,
            file_id: file_row.id,
        }),
    ))
}

/// GET /chat/files/{id} — download for chat participants and admins.
pub async fn download_chat_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    // file ids are uuids; anything else cannot address a stored blob
    file_id
        .parse::<Uuid>()
        .map_err(|_| ApiError::BadRequest("invalid file id".into()))?;

    let user_id = claims.sub.to_string();
    let role = claims.role;

    let db = state.clone();
    let file = run_blocking(move || {
        let (file, message) =
            db.db.get_chat_file(&file_id)?.ok_or(StoreError::NotFound("file"))?;

        let allowed = user_id == message.sender_id
            || user_id == message.recipient_id
            || role == UserRole::Admin;
        if !allowed {
            return Err(StoreError::Forbidden);
        }
        Ok(file)
    })
    .await?;

    let bytes = tokio::fs::read(&file.file_path).await.map_err(|e| {
        error!("Failed to read file {}: {}", file.file_path, e);
        ApiError::NotFound("file")
    })?;

    let content_type = file
        .mime_type
        .unwrap_or_else(|| "application/octet-stream".into());
    let disposition = format!("attachment; filename=\"{}\"", file.original_name.replace('"', ""));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

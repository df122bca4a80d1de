use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use kadra_db::models::{ChatFileRow, MessageRow};
use kadra_db::queries::messages::ChatEntry;
use kadra_types::api::{
    ChatFileInfo, ChatHistoryResponse, ChatMessage, Claims, MessagesOverviewResponse,
    SendChatMessageRequest, SendChatMessageResponse, SendDirectMessageRequest,
    UnreadCountResponse,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

pub async fn get_chat(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let db = state.clone();
    let entries =
        run_blocking(move || db.db.list_application_messages(&application_id, &user_id)).await?;

    Ok(Json(ChatHistoryResponse {
        success: true,
        messages: entries.into_iter().map(chat_message).collect(),
    }))
}

pub async fn send_chat_message(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendChatMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".into()));
    }

    let user_id = claims.sub.to_string();
    let db = state.clone();
    let message =
        run_blocking(move || db.db.send_application_message(&application_id, &user_id, &content))
            .await?;

    Ok((
        StatusCode::CREATED,
        Json(SendChatMessageResponse { success: true, message_id: message.id }),
    ))
}

pub async fn mark_chat_read(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let db = state.clone();
    let marked =
        run_blocking(move || db.db.mark_application_read(&application_id, &user_id)).await?;

    Ok(Json(json!({ "success": true, "marked_read": marked })))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let db = state.clone();
    let unread =
        run_blocking(move || db.db.unread_application_count(&application_id, &user_id)).await?;

    Ok(Json(UnreadCountResponse { unread_count: unread }))
}

pub async fn send_direct_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendDirectMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".into()));
    }

    let sender_id = claims.sub.to_string();
    let db = state.clone();
    let message =
        run_blocking(move || db.db.send_direct_message(&sender_id, &req.recipient_id, &content))
            .await?;

    Ok((
        StatusCode::CREATED,
        Json(SendChatMessageResponse { success: true, message_id: message.id }),
    ))
}

pub async fn messages_overview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let db = state.clone();
    let (sent, received) = run_blocking(move || {
        let sent = db.db.list_sent_messages(&user_id)?;
        let received = db.db.list_received_messages(&user_id)?;
        Ok((sent, received))
    })
    .await?;

    Ok(Json(MessagesOverviewResponse {
        sent: sent.into_iter().map(plain_message).collect(),
        received: received.into_iter().map(plain_message).collect(),
    }))
}

pub(crate) fn chat_message(entry: ChatEntry) -> ChatMessage {
    let ChatEntry { message, sender_name } = entry;
    ChatMessage {
        id: message.id,
        sender_id: message.sender_id,
        sender_name: Some(sender_name),
        recipient_id: message.recipient_id,
        application_id: message.application_id,
        content: message.content,
        message_type: message.message_type,
        is_read: message.is_read,
        created_at: message.created_at,
    }
}

pub(crate) fn plain_message(message: MessageRow) -> ChatMessage {
    ChatMessage {
        id: message.id,
        sender_id: message.sender_id,
        sender_name: None,
        recipient_id: message.recipient_id,
        application_id: message.application_id,
        content: message.content,
        message_type: message.message_type,
        is_read: message.is_read,
        created_at: message.created_at,
    }
}

pub(crate) fn chat_file_info(file: ChatFileRow) -> ChatFileInfo {
    ChatFileInfo {
        id: file.id,
        message_id: file.message_id,
        original_name: file.original_name,
        file_size: file.file_size,
        mime_type: file.mime_type,
        created_at: file.created_at,
    }
}

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use kadra_db::models::NotificationRow;
use kadra_types::api::{Claims, NotificationResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let db = state.clone();
    let (rows, unread) = run_blocking(move || {
        let rows = db.db.list_notifications(&user_id)?;
        let unread = db.db.unread_notifications_count(&user_id)?;
        Ok((rows, unread))
    })
    .await?;

    let notifications: Vec<NotificationResponse> =
        rows.into_iter().map(notification_response).collect();
    Ok(Json(json!({ "notifications": notifications, "unread_count": unread })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let db = state.clone();
    let marked =
        run_blocking(move || db.db.mark_notification_read(&notification_id, &user_id)).await?;

    if !marked {
        return Err(ApiError::NotFound("notification"));
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let db = state.clone();
    let marked = run_blocking(move || db.db.mark_all_notifications_read(&user_id)).await?;

    Ok(Json(json!({ "success": true, "marked_read": marked })))
}

fn notification_response(n: NotificationRow) -> NotificationResponse {
    NotificationResponse {
        id: n.id,
        kind: n.kind,
        title: n.title,
        message: n.message,
        is_read: n.is_read,
        related_job_id: n.related_job_id,
        related_user_id: n.related_user_id,
        related_application_id: n.related_application_id,
        related_payment_id: n.related_payment_id,
        created_at: n.created_at,
    }
}

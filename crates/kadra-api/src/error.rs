use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use kadra_db::StoreError;

/// Handler-level failure, rendered as `{ "error": "..." }` with the
/// matching status code. Store business-rule violations map to precise
/// statuses instead of a blanket 500.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    Forbidden,
    NotFound(&'static str),
    Conflict(String),
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "authentication required".into()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "access denied".into()),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".into())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ApiError::NotFound(what),
            StoreError::Forbidden => ApiError::Forbidden,
            StoreError::EmailTaken => ApiError::Conflict(err.to_string()),
            StoreError::AlreadyApplied
            | StoreError::JobNotOpen
            | StoreError::ApplicationLimit
            | StoreError::RecruiterCap
            | StoreError::NotAwaitingModeration
            | StoreError::PaymentSettled => ApiError::BadRequest(err.to_string()),
            StoreError::LockPoisoned | StoreError::Db(_) => {
                error!("store error: {}", err);
                ApiError::Internal
            }
        }
    }
}

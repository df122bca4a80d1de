//! HTTP handlers for the marketplace REST API.

pub mod admin;
pub mod applications;
pub mod auth;
pub mod chat;
pub mod error;
pub mod files;
pub mod jobs;
pub mod middleware;
pub mod notifications;
pub mod payments;
pub mod profile;
pub mod ratings;
pub mod stats;

use tracing::error;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;

/// Run a blocking store operation off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> kadra_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}

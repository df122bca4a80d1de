use axum::{Json, extract::State, response::IntoResponse};

use kadra_types::api::PublicStats;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

pub async fn public_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let stats = run_blocking(move || db.db.public_stats()).await?;

    Ok(Json(PublicStats {
        open_jobs: stats.open_jobs,
        total_recruiters: stats.total_recruiters,
        total_employers: stats.total_employers,
    }))
}

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use kadra_types::api::{AdminDashboard, Claims, JobResponse, ModerateJobRequest, ModerationAction};
use kadra_types::models::{JobStatus, UserRole};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::jobs::job_response;
use crate::run_blocking;

#[derive(Debug, Deserialize)]
pub struct AdminJobsQuery {
    #[serde(default)]
    pub status: Option<JobStatus>,
}

fn require_admin(claims: &Claims) -> Result<(), ApiError> {
    if claims.role != UserRole::Admin {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;

    let db = state.clone();
    let stats = run_blocking(move || db.db.admin_stats()).await?;

    Ok(Json(AdminDashboard {
        total_users: stats.total_users,
        total_jobs: stats.total_jobs,
        pending_jobs: stats.pending_jobs,
        paid_payments: stats.paid_payments,
        total_revenue: stats.total_revenue,
        pending_jobs_list: stats.pending_jobs_list.into_iter().map(job_response).collect(),
    }))
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<AdminJobsQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;

    let db = state.clone();
    let jobs = run_blocking(move || db.db.list_all_jobs(query.status)).await?;

    let jobs: Vec<JobResponse> = jobs.into_iter().map(job_response).collect();
    Ok(Json(jobs))
}

pub async fn moderate_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ModerateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&claims)?;

    let approve = req.action == ModerationAction::Approve;
    let moderator_id = claims.sub.to_string();

    let db = state.clone();
    let jid = job_id.clone();
    let job =
        run_blocking(move || db.db.moderate_job(&jid, &moderator_id, approve, req.comment.as_deref()))
            .await?;

    info!(job_id, approve, "job moderated");
    Ok(Json(job_response(job)))
}

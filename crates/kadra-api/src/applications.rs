use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use kadra_db::StoreError;
use kadra_db::models::ApplicationRow;
use kadra_types::api::{
    ApplicationDetailResponse, ApplicationResponse, ApplyRequest, ChangeApplicationStatusRequest,
    Claims, MyApplicationEntry, MyApplicationsResponse,
};
use kadra_types::models::{ApplicationStatus, UserRole};

use crate::auth::AppState;
use crate::chat::{chat_file_info, chat_message};
use crate::error::ApiError;
use crate::jobs::job_response;
use crate::ratings::recruiter_brief;
use crate::run_blocking;

#[derive(Debug, Deserialize)]
pub struct MyApplicationsQuery {
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    /// "asc" or "desc" by application date; newest first by default.
    #[serde(default)]
    pub order: Option<String>,
}

pub async fn apply(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ApplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != UserRole::Recruiter {
        return Err(ApiError::Forbidden);
    }
    if req.cover_letter.trim().is_empty() {
        return Err(ApiError::BadRequest("cover letter must not be empty".into()));
    }

    let application_id = Uuid::new_v4().to_string();
    let recruiter_id = claims.sub.to_string();

    let db = state.clone();
    let aid = application_id.clone();
    let application = run_blocking(move || {
        let recruiter =
            db.db.get_user_by_id(&recruiter_id)?.ok_or(StoreError::NotFound("user"))?;
        db.db.apply_to_job(&aid, &job_id, &recruiter_id, &recruiter.name, req.cover_letter.trim())
    })
    .await?;

    Ok((StatusCode::CREATED, Json(application_response(application))))
}

pub async fn my_applications(
    State(state): State<AppState>,
    Query(query): Query<MyApplicationsQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != UserRole::Recruiter {
        return Err(ApiError::Forbidden);
    }

    let ascending = query.order.as_deref() == Some("asc");
    let recruiter_id = claims.sub.to_string();
    let pricing = state.pricing;

    let db = state.clone();
    let response = run_blocking(move || {
        let rows = db.db.list_applications_by_recruiter(&recruiter_id, query.status, ascending)?;

        let mut entries = Vec::with_capacity(rows.len());
        let (mut pending, mut selected, mut working, mut completed, mut rejected) = (0, 0, 0, 0, 0);
        let mut total_potential_earnings = 0;

        for (application, job) in rows {
            match application.status {
                ApplicationStatus::Pending => pending += 1,
                ApplicationStatus::Selected => selected += 1,
                ApplicationStatus::Working => working += 1,
                ApplicationStatus::Completed => completed += 1,
                ApplicationStatus::Rejected => rejected += 1,
            }

            let posting_price = match db.db.get_payment_for_job(&job.id)? {
                Some(payment) => payment.amount,
                None => pricing.posting_price(job.salary_min, job.salary_max),
            };
            let earnings = pricing.recruiter_earnings(posting_price);
            if application.status.occupies_slot()
                || application.status == ApplicationStatus::Completed
            {
                total_potential_earnings += earnings;
            }

            entries.push(MyApplicationEntry {
                application: application_response(application),
                job: job_response(job),
                recruiter_earnings: earnings,
            });
        }

        Ok(MyApplicationsResponse {
            total_applications: entries.len(),
            applications: entries,
            pending,
            selected,
            working,
            completed,
            rejected,
            total_potential_earnings,
        })
    })
    .await?;

    Ok(Json(response))
}

pub async fn application_detail(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let role = claims.role;
    let pricing = state.pricing;

    let db = state.clone();
    let response = run_blocking(move || {
        let application = db
            .db
            .get_application(&application_id)?
            .ok_or(StoreError::NotFound("application"))?;
        let job = db.db.get_job(&application.job_id)?.ok_or(StoreError::NotFound("job"))?;

        let is_recruiter = user_id == application.recruiter_id;
        let is_employer = user_id == job.employer_id;
        if !is_recruiter && !is_employer && role != UserRole::Admin {
            return Err(StoreError::Forbidden);
        }

        let posting_price = match db.db.get_payment_for_job(&job.id)? {
            Some(payment) => payment.amount,
            None => pricing.posting_price(job.salary_min, job.salary_max),
        };

        let mut selected_recruiters = Vec::new();
        for recruiter in db.db.selected_recruiters(&job.id)? {
            let summary = db.db.rating_summary(&recruiter.id)?;
            selected_recruiters.push(recruiter_brief(&recruiter, summary));
        }

        let messages = db
            .db
            .list_application_messages(&application_id, &user_id)?
            .into_iter()
            .map(chat_message)
            .collect();
        let files = db
            .db
            .list_application_files(&application_id)?
            .into_iter()
            .map(chat_file_info)
            .collect();

        Ok(ApplicationDetailResponse {
            application: application_response(application),
            job: job_response(job),
            posting_price: (is_employer || role == UserRole::Admin).then_some(posting_price),
            recruiter_earnings: is_recruiter
                .then(|| pricing.recruiter_earnings(posting_price)),
            selected_recruiters,
            messages,
            files,
        })
    })
    .await?;

    Ok(Json(response))
}

pub async fn change_application_status(
    State(state): State<AppState>,
    Path(application_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChangeApplicationStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != UserRole::Employer {
        return Err(ApiError::Forbidden);
    }

    let employer_id = claims.sub.to_string();
    let db = state.clone();
    let (application, job) = run_blocking(move || {
        db.db.set_application_status(&application_id, &employer_id, req.status)
    })
    .await?;

    Ok(Json(serde_json::json!({
        "application": application_response(application),
        "job_status": job.status,
    })))
}

pub(crate) fn application_response(application: ApplicationRow) -> ApplicationResponse {
    ApplicationResponse {
        id: application.id,
        job_id: application.job_id,
        recruiter_id: application.recruiter_id,
        cover_letter: application.cover_letter,
        status: application.status,
        created_at: application.created_at,
    }
}

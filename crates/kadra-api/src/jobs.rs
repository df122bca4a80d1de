use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use kadra_core::lifecycle::RECRUITER_SLOTS;
use kadra_db::models::JobRow;
use kadra_db::queries::jobs::JobFilter;
use kadra_types::api::{
    ChangeJobStatusRequest, Claims, CreateJobRequest, CreateJobResponse, EmployerAnalytics,
    JobResponse, JobWithCounts, MyJobApplication, MyJobEntry, MyJobsResponse,
};
use kadra_types::models::{JobStatus, UserRole};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::ratings::recruiter_brief;
use crate::run_blocking;

#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub salary_min: Option<i64>,
    #[serde(default)]
    pub salary_max: Option<i64>,
}

pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateJobRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != UserRole::Employer {
        return Err(ApiError::Forbidden);
    }
    if req.title.trim().len() < 3 {
        return Err(ApiError::BadRequest("title must be at least 3 characters".into()));
    }
    if req.description.trim().len() < 10 {
        return Err(ApiError::BadRequest("description must be at least 10 characters".into()));
    }
    if req.salary_min < 0 || req.salary_max < 0 || req.salary_min > req.salary_max {
        return Err(ApiError::BadRequest("invalid salary range".into()));
    }

    let posting_price = state.pricing.posting_price(req.salary_min, req.salary_max);
    let job_id = Uuid::new_v4().to_string();
    let payment_id = Uuid::new_v4().to_string();

    let new_job = kadra_db::models::NewJob {
        id: job_id.clone(),
        employer_id: claims.sub.to_string(),
        title: req.title.trim().to_string(),
        short_description: Some(req.short_description),
        description: req.description,
        requirements: req.requirements,
        benefits: req.benefits,
        location: req.location,
        employment_type: req.employment_type.unwrap_or_else(|| "full-time".into()),
        experience_level: req.experience_level,
        salary_min: req.salary_min,
        salary_max: req.salary_max,
        max_applications: RECRUITER_SLOTS,
    };

    let db = state.clone();
    let pid = payment_id.clone();
    let job =
        run_blocking(move || db.db.create_job_with_payment(&new_job, &pid, posting_price)).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateJobResponse {
            job_id,
            payment_id,
            posting_price,
            status: job.status,
        }),
    ))
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = JobFilter {
        q: query.q,
        salary_min: query.salary_min,
        salary_max: query.salary_max,
    };

    let db = state.clone();
    let listings = run_blocking(move || db.db.list_public_jobs(&filter)).await?;

    let jobs: Vec<JobWithCounts> = listings
        .into_iter()
        .map(|l| with_counts(l.job, l.applications_count, l.selected_count))
        .collect();
    Ok(Json(jobs))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let id = job_id.clone();
    let (job, counts) = run_blocking(move || db.db.get_job_with_counts(&id))
        .await?
        .ok_or(ApiError::NotFound("job"))?;

    // unmoderated and rejected jobs stay invisible
    if matches!(job.status, JobStatus::Draft | JobStatus::Pending | JobStatus::Rejected) {
        return Err(ApiError::NotFound("job"));
    }

    let db = state.clone();
    run_blocking(move || db.db.increment_job_views(&job_id)).await?;

    Ok(Json(with_counts(job, counts.applications, counts.selected)))
}

pub async fn my_jobs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != UserRole::Employer {
        return Err(ApiError::Forbidden);
    }

    let employer_id = claims.sub.to_string();
    let pricing = state.pricing;
    let db = state.clone();

    let response = run_blocking(move || {
        let mut entries = Vec::new();
        for job in db.db.list_jobs_by_employer(&employer_id)? {
            let posting_price = match db.db.get_payment_for_job(&job.id)? {
                Some(payment) => payment.amount,
                None => pricing.posting_price(job.salary_min, job.salary_max),
            };
            let per_person = pricing.recruiter_earnings(posting_price);

            let mut applications = Vec::new();
            for application in db.db.list_applications_for_job(&job.id)? {
                let Some(recruiter) = db.db.get_user_by_id(&application.recruiter_id)? else {
                    continue;
                };
                let summary = db.db.rating_summary(&recruiter.id)?;
                applications.push(MyJobApplication {
                    application: crate::applications::application_response(application),
                    recruiter: recruiter_brief(&recruiter, summary),
                    recruiter_payment: per_person,
                });
            }

            entries.push(MyJobEntry {
                job: job_response(job),
                applications,
                posting_price,
                platform_fee: pricing.platform_fee(posting_price),
                recruiter_payment_per_person: per_person,
            });
        }

        let stats = db.db.employer_stats(&employer_id)?;
        Ok(MyJobsResponse {
            jobs: entries,
            analytics: EmployerAnalytics {
                total_jobs: stats.total_jobs,
                completed_jobs: stats.completed_jobs,
                open_jobs: stats.open_jobs,
                in_progress_jobs: stats.in_progress_jobs,
                success_rate: stats.success_rate,
                avg_time_to_fill_days: stats.avg_time_to_fill_days,
            },
        })
    })
    .await?;

    Ok(Json(response))
}

pub async fn change_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ChangeJobStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != UserRole::Employer {
        return Err(ApiError::Forbidden);
    }

    let db = state.clone();
    let employer_id = claims.sub.to_string();
    let job = run_blocking(move || {
        db.db.set_job_status_manual(&job_id, &employer_id, req.status, req.reason.as_deref())
    })
    .await?;

    Ok(Json(job_response(job)))
}

pub(crate) fn job_response(job: JobRow) -> JobResponse {
    JobResponse {
        id: job.id,
        employer_id: job.employer_id,
        title: job.title,
        short_description: job.short_description,
        description: job.description,
        requirements: job.requirements,
        benefits: job.benefits,
        location: job.location,
        employment_type: job.employment_type,
        experience_level: job.experience_level,
        salary_min: job.salary_min,
        salary_max: job.salary_max,
        salary_currency: job.salary_currency,
        max_applications: job.max_applications,
        status: job.status,
        status_reason: job.status_reason,
        created_at: job.created_at,
    }
}

fn with_counts(job: JobRow, applications: i64, selected: i64) -> JobWithCounts {
    let applications_left = (job.max_applications - applications).max(0);
    let available_recruiter_slots = (RECRUITER_SLOTS - selected).max(0);
    JobWithCounts {
        job: job_response(job),
        applications_count: applications,
        applications_left,
        selected_recruiters_count: selected,
        available_recruiter_slots,
    }
}

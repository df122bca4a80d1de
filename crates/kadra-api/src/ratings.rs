use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use kadra_db::StoreError;
use kadra_db::models::{RatingRow, UserRow};
use kadra_db::queries::ratings::RatingSummary;
use kadra_types::api::{
    Claims, RateRecruiterRequest, RatingResponse, RecruiterBrief, RecruiterProfileResponse,
    TopRecruiterEntry,
};
use kadra_types::models::UserRole;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

pub async fn rate_recruiter(
    State(state): State<AppState>,
    Path(recruiter_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RateRecruiterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != UserRole::Employer {
        return Err(ApiError::Forbidden);
    }
    if !(1.0..=5.0).contains(&req.rating) {
        return Err(ApiError::BadRequest("rating must be between 1 and 5".into()));
    }

    let employer_id = claims.sub.to_string();
    let db = state.clone();
    let rating = run_blocking(move || {
        db.db.upsert_rating(
            &recruiter_id,
            &employer_id,
            req.job_id.as_deref(),
            req.rating,
            req.comment.as_deref(),
        )
    })
    .await?;

    Ok(Json(rating_response(rating)))
}

/// Public recruiter profile with the ratings feed. Email and contact
/// details stay private.
pub async fn recruiter_profile(
    State(state): State<AppState>,
    Path(recruiter_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let response = run_blocking(move || {
        let user = db.db.get_user_by_id(&recruiter_id)?.ok_or(StoreError::NotFound("user"))?;
        if user.role != UserRole::Recruiter {
            return Err(StoreError::NotFound("recruiter"));
        }

        let summary = db.db.rating_summary(&recruiter_id)?;
        let ratings = db
            .db
            .list_ratings_for_recruiter(&recruiter_id)?
            .into_iter()
            .map(|(rating, _employer_name)| rating_response(rating))
            .collect();

        Ok(RecruiterProfileResponse {
            id: user.id,
            name: user.name,
            location: user.location,
            bio: user.bio,
            experience: user.experience,
            specialization: user.specialization,
            portfolio_url: user.portfolio_url,
            avg_rating: (summary.count > 0).then_some(summary.average),
            ratings_count: summary.count,
            ratings,
        })
    })
    .await?;

    Ok(Json(response))
}

pub async fn top_recruiters(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query.limit.clamp(1, 100);
    let db = state.clone();
    let top = run_blocking(move || db.db.top_recruiters(limit)).await?;

    let entries: Vec<TopRecruiterEntry> = top
        .into_iter()
        .map(|entry| TopRecruiterEntry {
            recruiter: recruiter_brief(
                &entry.user,
                RatingSummary { average: entry.average, count: entry.ratings_count },
            ),
            completed_projects: entry.completed_projects,
        })
        .collect();
    Ok(Json(entries))
}

pub(crate) fn recruiter_brief(user: &UserRow, summary: RatingSummary) -> RecruiterBrief {
    RecruiterBrief {
        id: user.id.clone(),
        name: user.name.clone(),
        specialization: user.specialization.clone(),
        avg_rating: (summary.count > 0).then_some(summary.average),
        ratings_count: summary.count,
    }
}

fn rating_response(rating: RatingRow) -> RatingResponse {
    RatingResponse {
        id: rating.id,
        recruiter_id: rating.recruiter_id,
        employer_id: rating.employer_id,
        job_id: rating.job_id,
        rating: rating.rating,
        comment: rating.comment,
        created_at: rating.created_at,
    }
}

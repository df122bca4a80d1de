use axum::{Extension, Json, extract::State, response::IntoResponse};

use kadra_db::models::{ProfileUpdate, UserRow};
use kadra_types::api::{Claims, ProfileResponse, UpdateProfileRequest};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let id = claims.sub.to_string();
    let user = run_blocking(move || db.db.get_user_by_id(&id))
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(profile_response(user)))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().len() < 2 {
        return Err(ApiError::BadRequest("name must be at least 2 characters".into()));
    }

    let update = ProfileUpdate {
        name: req.name.trim().to_string(),
        phone: req.phone,
        location: req.location,
        bio: req.bio,
        experience: req.experience,
        specialization: req.specialization,
        portfolio_url: req.portfolio_url,
        resume_url: req.resume_url,
        company: req.company,
        company_description: req.company_description,
        website: req.website,
    };

    let db = state.clone();
    let id = claims.sub.to_string();
    let user = run_blocking(move || db.db.update_profile(&id, &update)).await?;
    Ok(Json(profile_response(user)))
}

pub(crate) fn profile_response(user: UserRow) -> ProfileResponse {
    ProfileResponse {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
        phone: user.phone,
        location: user.location,
        bio: user.bio,
        experience: user.experience,
        specialization: user.specialization,
        portfolio_url: user.portfolio_url,
        resume_url: user.resume_url,
        company: user.company,
        company_description: user.company_description,
        website: user.website,
        created_at: user.created_at,
    }
}

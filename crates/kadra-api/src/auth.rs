use std::path::PathBuf;
use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::HeaderMap, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::warn;
use uuid::Uuid;

use kadra_core::pricing::PricingConfig;
use kadra_db::Database;
use kadra_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use kadra_types::models::UserRole;

use crate::error::ApiError;
use crate::{middleware, run_blocking};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub pricing: PricingConfig,
    pub upload_dir: PathBuf,
}

pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().len() < 2 {
        return Err(ApiError::BadRequest("name must be at least 2 characters".into()));
    }
    if !req.email.contains('@') {
        return Err(ApiError::BadRequest("invalid email address".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest("password must be at least 8 characters".into()));
    }

    // Only an existing admin can mint another admin account
    if req.role == UserRole::Admin && !bearer_is_admin(&headers) {
        warn!("rejected admin registration for {}", req.email);
        return Err(ApiError::Forbidden);
    }

    let email = req.email.trim().to_lowercase();

    let db = state.clone();
    let lookup = email.clone();
    if run_blocking(move || db.db.get_user_by_email(&lookup)).await?.is_some() {
        return Err(ApiError::Conflict("email is already registered".into()));
    }

    let password_hash = hash_password(&req.password).map_err(|_| ApiError::Internal)?;
    let user_id = Uuid::new_v4();

    let db = state.clone();
    let (id, insert_email, name, role) =
        (user_id.to_string(), email.clone(), req.name.trim().to_string(), req.role);
    run_blocking(move || db.db.create_user(&id, &insert_email, &name, &password_hash, role))
        .await?;

    let token = create_token(&state.jwt_secret, user_id, &email, req.role)
        .map_err(|_| ApiError::Internal)?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();

    let db = state.clone();
    let lookup = email.clone();
    let user = run_blocking(move || db.db.get_user_by_email(&lookup))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let parsed_hash = PasswordHash::new(&user.password).map_err(|_| ApiError::Internal)?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized)?;

    let user_id: Uuid = user.id.parse().map_err(|_| ApiError::Internal)?;

    let db = state.clone();
    let id = user.id.clone();
    run_blocking(move || db.db.touch_last_login(&id)).await?;

    let token = create_token(&state.jwt_secret, user_id, &user.email, user.role)
        .map_err(|_| ApiError::Internal)?;

    Ok(Json(LoginResponse {
        user_id,
        email: user.email,
        name: user.name,
        role: user.role,
        token,
    }))
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
        .to_string();
    Ok(hash)
}

fn create_token(secret: &str, user_id: Uuid, email: &str, role: UserRole) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn bearer_is_admin(headers: &HeaderMap) -> bool {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(middleware::decode_claims)
        .is_some_and(|claims| claims.role == UserRole::Admin)
}

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use kadra_api::auth::{self, AppState, AppStateInner};
use kadra_api::middleware::require_auth;
use kadra_api::{admin, applications, chat, files, jobs, notifications, payments, profile, ratings, stats};
use kadra_core::pricing::PricingConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kadra=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("KADRA_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("KADRA_DB_PATH").unwrap_or_else(|_| "kadra.db".into());
    let host = std::env::var("KADRA_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("KADRA_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let upload_dir =
        PathBuf::from(std::env::var("KADRA_UPLOAD_DIR").unwrap_or_else(|_| "./uploads".into()));

    // Init database
    let db = kadra_db::Database::open(&PathBuf::from(&db_path))?;
    seed_default_admin(&db)?;

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        pricing: PricingConfig::default(),
        upload_dir,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/{job_id}", get(jobs::get_job))
        .route("/stats", get(stats::public_stats))
        .route("/recruiters/top", get(ratings::top_recruiters))
        .route("/recruiters/{recruiter_id}", get(ratings::recruiter_profile))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/me", get(profile::me).put(profile::update_me))
        .route("/jobs", post(jobs::create_job))
        .route("/my/jobs", get(jobs::my_jobs))
        .route("/jobs/{job_id}/status", post(jobs::change_job_status))
        .route("/jobs/{job_id}/payment", get(payments::get_payment).post(payments::pay))
        .route("/jobs/{job_id}/apply", post(applications::apply))
        .route("/my/applications", get(applications::my_applications))
        .route("/applications/{application_id}", get(applications::application_detail))
        .route(
            "/applications/{application_id}/status",
            post(applications::change_application_status),
        )
        .route(
            "/applications/{application_id}/messages",
            get(chat::get_chat).post(chat::send_chat_message),
        )
        .route("/applications/{application_id}/messages/read", post(chat::mark_chat_read))
        .route(
            "/applications/{application_id}/messages/unread-count",
            get(chat::unread_count),
        )
        .route("/applications/{application_id}/files", post(files::upload_chat_file))
        .route("/chat/files/{file_id}", get(files::download_chat_file))
        .route("/messages", get(chat::messages_overview).post(chat::send_direct_message))
        .route("/notifications", get(notifications::list))
        .route("/notifications/{notification_id}/read", post(notifications::mark_read))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/recruiters/{recruiter_id}/rating", post(ratings::rate_recruiter))
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/jobs", get(admin::list_jobs))
        .route("/admin/jobs/{job_id}/moderate", post(admin::moderate_job))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Kadra server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// First boot seeds an admin account so moderation works out of the box.
/// Credentials come from the environment; the password should be rotated
/// through the profile endpoint in real deployments.
fn seed_default_admin(db: &kadra_db::Database) -> anyhow::Result<()> {
    let email =
        std::env::var("KADRA_ADMIN_EMAIL").unwrap_or_else(|_| "admin@kadra.kz".into());
    let password = std::env::var("KADRA_ADMIN_PASSWORD").unwrap_or_else(|_| "admin12345".into());

    let hash = auth::hash_password(&password)?;
    let created = db.ensure_default_admin(&Uuid::new_v4().to_string(), &email, "Administrator", &hash)?;
    if created {
        info!("Created default admin account {}", email);
    }
    Ok(())
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    ApplicationStatus, JobStatus, MessageType, NotificationKind, PaymentStatus, UserRole,
};

// -- JWT Claims --

/// JWT claims shared by the REST middleware and the handlers. Carrying the
/// role lets handlers authorize with an exhaustive match instead of a user
/// lookup per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: UserRole,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub token: String,
}

// -- Profiles --

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    // Recruiter fields
    pub experience: Option<String>,
    pub specialization: Option<String>,
    pub portfolio_url: Option<String>,
    pub resume_url: Option<String>,
    // Employer fields
    pub company: Option<String>,
    pub company_description: Option<String>,
    pub website: Option<String>,
    pub created_at: String,
}

/// Role-specific fields are accepted for everyone but only persisted for
/// the matching role.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub experience: Option<String>,
    pub specialization: Option<String>,
    pub portfolio_url: Option<String>,
    pub resume_url: Option<String>,
    pub company: Option<String>,
    pub company_description: Option<String>,
    pub website: Option<String>,
}

// -- Jobs --

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub short_description: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Option<String>,
    #[serde(default)]
    pub benefits: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    pub salary_min: i64,
    pub salary_max: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateJobResponse {
    pub job_id: String,
    pub payment_id: String,
    pub posting_price: f64,
    pub status: JobStatus,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub id: String,
    pub employer_id: String,
    pub title: String,
    pub short_description: Option<String>,
    pub description: String,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
    pub location: Option<String>,
    pub employment_type: String,
    pub experience_level: Option<String>,
    pub salary_min: i64,
    pub salary_max: i64,
    pub salary_currency: String,
    pub max_applications: i64,
    pub status: JobStatus,
    pub status_reason: Option<String>,
    pub created_at: String,
}

/// A listing entry with the derived counters the clients render next to
/// every job card.
#[derive(Debug, Serialize)]
pub struct JobWithCounts {
    pub job: JobResponse,
    pub applications_count: i64,
    pub applications_left: i64,
    pub selected_recruiters_count: i64,
    pub available_recruiter_slots: i64,
}

#[derive(Debug, Deserialize)]
pub struct ChangeJobStatusRequest {
    pub status: JobStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    Approve,
    Reject,
}

#[derive(Debug, Deserialize)]
pub struct ModerateJobRequest {
    pub action: ModerationAction,
    #[serde(default)]
    pub comment: Option<String>,
}

// -- Payments --

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub job_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub paid_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PayRequest {
    pub payment_method: String,
}

#[derive(Debug, Serialize)]
pub struct PayResponse {
    pub payment: PaymentResponse,
    pub job_status: JobStatus,
}

// -- Applications --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplyRequest {
    pub cover_letter: String,
}

#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    pub id: String,
    pub job_id: String,
    pub recruiter_id: String,
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct RecruiterBrief {
    pub id: String,
    pub name: String,
    pub specialization: Option<String>,
    pub avg_rating: Option<f64>,
    pub ratings_count: i64,
}

#[derive(Debug, Serialize)]
pub struct MyApplicationEntry {
    pub application: ApplicationResponse,
    pub job: JobResponse,
    /// The recruiter's share of the posting price, in whole currency units.
    pub recruiter_earnings: i64,
}

#[derive(Debug, Serialize)]
pub struct MyApplicationsResponse {
    pub applications: Vec<MyApplicationEntry>,
    pub total_applications: usize,
    pub pending: usize,
    pub selected: usize,
    pub working: usize,
    pub completed: usize,
    pub rejected: usize,
    pub total_potential_earnings: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeApplicationStatusRequest {
    pub status: ApplicationStatus,
}

#[derive(Debug, Serialize)]
pub struct ApplicationDetailResponse {
    pub application: ApplicationResponse,
    pub job: JobResponse,
    /// Full posting price; present for the employer and admin views only.
    pub posting_price: Option<f64>,
    /// Recruiter share; present for the recruiter view only.
    pub recruiter_earnings: Option<i64>,
    pub selected_recruiters: Vec<RecruiterBrief>,
    pub messages: Vec<ChatMessage>,
    pub files: Vec<ChatFileInfo>,
}

// -- Employer job management --

#[derive(Debug, Serialize)]
pub struct MyJobApplication {
    pub application: ApplicationResponse,
    pub recruiter: RecruiterBrief,
    pub recruiter_payment: i64,
}

#[derive(Debug, Serialize)]
pub struct MyJobEntry {
    pub job: JobResponse,
    pub applications: Vec<MyJobApplication>,
    pub posting_price: f64,
    pub platform_fee: i64,
    pub recruiter_payment_per_person: i64,
}

#[derive(Debug, Serialize)]
pub struct EmployerAnalytics {
    pub total_jobs: i64,
    pub completed_jobs: i64,
    pub open_jobs: i64,
    pub in_progress_jobs: i64,
    pub success_rate: f64,
    pub avg_time_to_fill_days: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct MyJobsResponse {
    pub jobs: Vec<MyJobEntry>,
    pub analytics: EmployerAnalytics,
}

// -- Chat --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendChatMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub recipient_id: String,
    pub application_id: Option<String>,
    pub content: String,
    pub message_type: MessageType,
    pub is_read: bool,
    pub created_at: String,
}

/// The chat endpoints keep the `{ success, ... }` envelope the web client
/// already speaks.
#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub success: bool,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct SendChatMessageResponse {
    pub success: bool,
    pub message_id: String,
}

#[derive(Debug, Serialize)]
pub struct ChatFileInfo {
    pub id: String,
    pub message_id: String,
    pub original_name: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct UploadChatFileResponse {
    pub success: bool,
    pub message_id: String,
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendDirectMessageRequest {
    pub recipient_id: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessagesOverviewResponse {
    pub sent: Vec<ChatMessage>,
    pub received: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

// -- Notifications --

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub related_job_id: Option<String>,
    pub related_user_id: Option<String>,
    pub related_application_id: Option<String>,
    pub related_payment_id: Option<String>,
    pub created_at: String,
}

// -- Ratings --

#[derive(Debug, Deserialize)]
pub struct RateRecruiterRequest {
    pub rating: f64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub id: String,
    pub recruiter_id: String,
    pub employer_id: String,
    pub job_id: Option<String>,
    pub rating: f64,
    pub comment: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct RecruiterProfileResponse {
    pub id: String,
    pub name: String,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub experience: Option<String>,
    pub specialization: Option<String>,
    pub portfolio_url: Option<String>,
    pub avg_rating: Option<f64>,
    pub ratings_count: i64,
    pub ratings: Vec<RatingResponse>,
}

#[derive(Debug, Serialize)]
pub struct TopRecruiterEntry {
    pub recruiter: RecruiterBrief,
    pub completed_projects: i64,
}

// -- Stats --

#[derive(Debug, Serialize)]
pub struct PublicStats {
    pub open_jobs: i64,
    pub total_recruiters: i64,
    pub total_employers: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub total_users: i64,
    pub total_jobs: i64,
    pub pending_jobs: i64,
    pub paid_payments: i64,
    pub total_revenue: f64,
    pub pending_jobs_list: Vec<JobResponse>,
}

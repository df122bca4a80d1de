//! Database row types — these map directly to SQLite rows.
//! Distinct from the kadra-types API models to keep the store independent.

use kadra_types::models::{
    ApplicationStatus, JobStatus, MessageType, NotificationKind, PaymentStatus, UserRole,
};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: UserRole,
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
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub push_notifications: bool,
    pub last_login: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: String,
    pub employer_id: String,
    pub moderator_id: Option<String>,
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
    pub moderation_comment: Option<String>,
    pub moderated_at: Option<String>,
    pub winner_application_id: Option<String>,
    pub views_count: i64,
    pub filled_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct PaymentRow {
    pub id: String,
    pub job_id: String,
    pub employer_id: String,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub paid_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ApplicationRow {
    pub id: String,
    pub job_id: String,
    pub recruiter_id: String,
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub application_id: Option<String>,
    pub content: String,
    pub message_type: MessageType,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ChatFileRow {
    pub id: String,
    pub message_id: String,
    pub original_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct RatingRow {
    pub id: String,
    pub recruiter_id: String,
    pub employer_id: String,
    pub job_id: Option<String>,
    pub rating: f64,
    pub comment: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
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

/// Input for a notification insert; ids are borrowed from whatever the
/// surrounding transaction already holds.
#[derive(Debug)]
pub struct NewNotification<'a> {
    pub user_id: &'a str,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub job_id: Option<&'a str>,
    pub actor_id: Option<&'a str>,
    pub application_id: Option<&'a str>,
    pub payment_id: Option<&'a str>,
}

/// Fields for a new job; the caller provides the generated id.
#[derive(Debug)]
pub struct NewJob {
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
    pub max_applications: i64,
}

/// Role-specific profile update; the store persists only the fields that
/// match the user's role.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
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

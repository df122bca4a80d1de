//! Domain operations on the store, one module per aggregate.
//!
//! Shared row mappers live here so every module selects the same column
//! list for a given table. Multi-step mutations take `&mut Connection`
//! and run inside a single transaction.

pub mod applications;
pub mod jobs;
pub mod messages;
pub mod notifications;
pub mod payments;
pub mod ratings;
pub mod users;

use std::str::FromStr;

use kadra_types::models::ParseEnumError;
use rusqlite::Row;
use rusqlite::types::Type;

use crate::models::{
    ApplicationRow, ChatFileRow, JobRow, MessageRow, NotificationRow, PaymentRow, RatingRow,
    UserRow,
};

/// Parse a TEXT column into one of the closed domain enums, surfacing a
/// conversion failure with the column index like rusqlite's own getters.
pub(crate) fn parse_enum<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    value
        .parse()
        .map_err(|e: ParseEnumError| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) const USER_COLS: &str = "id, email, name, password, role, phone, location, bio, \
    experience, specialization, portfolio_url, resume_url, company, company_description, \
    website, email_notifications, sms_notifications, push_notifications, last_login, created_at";

pub(crate) fn map_user(row: &Row) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        password: row.get(3)?,
        role: parse_enum(4, row.get(4)?)?,
        phone: row.get(5)?,
        location: row.get(6)?,
        bio: row.get(7)?,
        experience: row.get(8)?,
        specialization: row.get(9)?,
        portfolio_url: row.get(10)?,
        resume_url: row.get(11)?,
        company: row.get(12)?,
        company_description: row.get(13)?,
        website: row.get(14)?,
        email_notifications: row.get(15)?,
        sms_notifications: row.get(16)?,
        push_notifications: row.get(17)?,
        last_login: row.get(18)?,
        created_at: row.get(19)?,
    })
}

pub(crate) const JOB_COLS: &str = "id, employer_id, moderator_id, title, short_description, \
    description, requirements, benefits, location, employment_type, experience_level, \
    salary_min, salary_max, salary_currency, max_applications, status, status_reason, \
    moderation_comment, moderated_at, winner_application_id, views_count, filled_at, created_at";

pub(crate) fn map_job(row: &Row) -> rusqlite::Result<JobRow> {
    Ok(JobRow {
        id: row.get(0)?,
        employer_id: row.get(1)?,
        moderator_id: row.get(2)?,
        title: row.get(3)?,
        short_description: row.get(4)?,
        description: row.get(5)?,
        requirements: row.get(6)?,
        benefits: row.get(7)?,
        location: row.get(8)?,
        employment_type: row.get(9)?,
        experience_level: row.get(10)?,
        salary_min: row.get(11)?,
        salary_max: row.get(12)?,
        salary_currency: row.get(13)?,
        max_applications: row.get(14)?,
        status: parse_enum(15, row.get(15)?)?,
        status_reason: row.get(16)?,
        moderation_comment: row.get(17)?,
        moderated_at: row.get(18)?,
        winner_application_id: row.get(19)?,
        views_count: row.get(20)?,
        filled_at: row.get(21)?,
        created_at: row.get(22)?,
    })
}

pub(crate) const PAYMENT_COLS: &str = "id, job_id, employer_id, amount, currency, status, \
    payment_method, transaction_id, paid_at, created_at";

pub(crate) fn map_payment(row: &Row) -> rusqlite::Result<PaymentRow> {
    Ok(PaymentRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        employer_id: row.get(2)?,
        amount: row.get(3)?,
        currency: row.get(4)?,
        status: parse_enum(5, row.get(5)?)?,
        payment_method: row.get(6)?,
        transaction_id: row.get(7)?,
        paid_at: row.get(8)?,
        created_at: row.get(9)?,
    })
}

pub(crate) const APPLICATION_COLS: &str =
    "id, job_id, recruiter_id, cover_letter, status, created_at";

pub(crate) fn map_application(row: &Row) -> rusqlite::Result<ApplicationRow> {
    Ok(ApplicationRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        recruiter_id: row.get(2)?,
        cover_letter: row.get(3)?,
        status: parse_enum(4, row.get(4)?)?,
        created_at: row.get(5)?,
    })
}

pub(crate) const MESSAGE_COLS: &str =
    "id, sender_id, recipient_id, application_id, content, message_type, is_read, created_at";

pub(crate) fn map_message(row: &Row) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        recipient_id: row.get(2)?,
        application_id: row.get(3)?,
        content: row.get(4)?,
        message_type: parse_enum(5, row.get(5)?)?,
        is_read: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub(crate) const CHAT_FILE_COLS: &str =
    "id, message_id, original_name, file_path, file_size, mime_type, created_at";

pub(crate) fn map_chat_file(row: &Row) -> rusqlite::Result<ChatFileRow> {
    Ok(ChatFileRow {
        id: row.get(0)?,
        message_id: row.get(1)?,
        original_name: row.get(2)?,
        file_path: row.get(3)?,
        file_size: row.get(4)?,
        mime_type: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub(crate) const RATING_COLS: &str =
    "id, recruiter_id, employer_id, job_id, rating, comment, created_at";

pub(crate) fn map_rating(row: &Row) -> rusqlite::Result<RatingRow> {
    Ok(RatingRow {
        id: row.get(0)?,
        recruiter_id: row.get(1)?,
        employer_id: row.get(2)?,
        job_id: row.get(3)?,
        rating: row.get(4)?,
        comment: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub(crate) const NOTIFICATION_COLS: &str = "id, user_id, kind, title, message, is_read, \
    related_job_id, related_user_id, related_application_id, related_payment_id, created_at";

pub(crate) fn map_notification(row: &Row) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: parse_enum(2, row.get(2)?)?,
        title: row.get(3)?,
        message: row.get(4)?,
        is_read: row.get(5)?,
        related_job_id: row.get(6)?,
        related_user_id: row.get(7)?,
        related_application_id: row.get(8)?,
        related_payment_id: row.get(9)?,
        created_at: row.get(10)?,
    })
}

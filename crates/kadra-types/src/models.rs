//! Closed domain enumerations, shared by the store and the API layer.
//!
//! Every enum is stored in SQLite as its snake_case string and travels
//! through JSON the same way, so `as_str` and `FromStr` are the single
//! source of truth for the wire/storage form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Raised when a stored or submitted string is not a member of the enum.
#[derive(Debug, Clone)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Employer,
    Recruiter,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Employer => "employer",
            UserRole::Recruiter => "recruiter",
            UserRole::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employer" => Ok(UserRole::Employer),
            "recruiter" => Ok(UserRole::Recruiter),
            "admin" => Ok(UserRole::Admin),
            _ => Err(ParseEnumError { kind: "user role", value: s.to_string() }),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Pending,
    Open,
    Paused,
    InProgress,
    Completed,
    Archived,
    Rejected,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::Pending => "pending",
            JobStatus::Open => "open",
            JobStatus::Paused => "paused",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Archived => "archived",
            JobStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for JobStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(JobStatus::Draft),
            "pending" => Ok(JobStatus::Pending),
            "open" => Ok(JobStatus::Open),
            "paused" => Ok(JobStatus::Paused),
            "in_progress" => Ok(JobStatus::InProgress),
            "completed" => Ok(JobStatus::Completed),
            "archived" => Ok(JobStatus::Archived),
            "rejected" => Ok(JobStatus::Rejected),
            _ => Err(ParseEnumError { kind: "job status", value: s.to_string() }),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Selected,
    Working,
    Completed,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Selected => "selected",
            ApplicationStatus::Working => "working",
            ApplicationStatus::Completed => "completed",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Selected and working applications occupy one of the job's
    /// recruiter slots.
    pub fn occupies_slot(&self) -> bool {
        matches!(self, ApplicationStatus::Selected | ApplicationStatus::Working)
    }
}

impl FromStr for ApplicationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "selected" => Ok(ApplicationStatus::Selected),
            "working" => Ok(ApplicationStatus::Working),
            "completed" => Ok(ApplicationStatus::Completed),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(ParseEnumError { kind: "application status", value: s.to_string() }),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(ParseEnumError { kind: "payment status", value: s.to_string() }),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewApplication,
    NewJob,
    NewMessage,
    JobStatusChange,
    ApplicationStatusChange,
    NewRating,
    JobApproved,
    JobRejected,
    PaymentSuccess,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewApplication => "new_application",
            NotificationKind::NewJob => "new_job",
            NotificationKind::NewMessage => "new_message",
            NotificationKind::JobStatusChange => "job_status_change",
            NotificationKind::ApplicationStatusChange => "application_status_change",
            NotificationKind::NewRating => "new_rating",
            NotificationKind::JobApproved => "job_approved",
            NotificationKind::JobRejected => "job_rejected",
            NotificationKind::PaymentSuccess => "payment_success",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new_application" => Ok(NotificationKind::NewApplication),
            "new_job" => Ok(NotificationKind::NewJob),
            "new_message" => Ok(NotificationKind::NewMessage),
            "job_status_change" => Ok(NotificationKind::JobStatusChange),
            "application_status_change" => Ok(NotificationKind::ApplicationStatusChange),
            "new_rating" => Ok(NotificationKind::NewRating),
            "job_approved" => Ok(NotificationKind::JobApproved),
            "job_rejected" => Ok(NotificationKind::JobRejected),
            "payment_success" => Ok(NotificationKind::PaymentSuccess),
            _ => Err(ParseEnumError { kind: "notification kind", value: s.to_string() }),
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    File,
    System,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::File => "file",
            MessageType::System => "system",
        }
    }
}

impl FromStr for MessageType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageType::Text),
            "file" => Ok(MessageType::File),
            "system" => Ok(MessageType::System),
            _ => Err(ParseEnumError { kind: "message type", value: s.to_string() }),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_round_trips_through_storage_form() {
        for s in [
            JobStatus::Draft,
            JobStatus::Pending,
            JobStatus::Open,
            JobStatus::Paused,
            JobStatus::InProgress,
            JobStatus::Completed,
            JobStatus::Archived,
            JobStatus::Rejected,
        ] {
            assert_eq!(s.as_str().parse::<JobStatus>().unwrap(), s);
        }
    }

    #[test]
    fn unknown_value_is_rejected() {
        assert!("banana".parse::<JobStatus>().is_err());
        assert!("".parse::<UserRole>().is_err());
    }

    #[test]
    fn slot_states() {
        assert!(ApplicationStatus::Selected.occupies_slot());
        assert!(ApplicationStatus::Working.occupies_slot());
        assert!(!ApplicationStatus::Pending.occupies_slot());
        assert!(!ApplicationStatus::Completed.occupies_slot());
        assert!(!ApplicationStatus::Rejected.occupies_slot());
    }
}

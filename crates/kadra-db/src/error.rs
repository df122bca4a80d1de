use kadra_core::lifecycle::RECRUITER_SLOTS;
use thiserror::Error;

/// Store-level failures. Business-rule violations get their own variants
/// so the API layer can map them to precise status codes instead of
/// pattern-matching on strings.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("access denied")]
    Forbidden,

    #[error("email is already registered")]
    EmailTaken,

    #[error("you have already applied to this job")]
    AlreadyApplied,

    #[error("this job is not accepting applications")]
    JobNotOpen,

    #[error("the application limit for this job has been reached")]
    ApplicationLimit,

    #[error("the limit of {} selected recruiters has been reached", RECRUITER_SLOTS)]
    RecruiterCap,

    #[error("this job is not awaiting moderation")]
    NotAwaitingModeration,

    #[error("this payment has already been settled")]
    PaymentSettled,

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

//! Automatic job status transitions and the recruiter-slot guard.
//!
//! `advance_job` is the single authority for how derived application
//! counts move a job forward. Both triggering paths (a new application
//! arriving, an employer changing an application's status) feed it the
//! fresh counts and apply whatever it decides.

use kadra_types::models::{ApplicationStatus, JobStatus};

/// Concurrent selected/working applications allowed per job.
pub const RECRUITER_SLOTS: i64 = 3;

/// Derived per-job counters, computed inside the same transaction that
/// mutates the applications.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobCounts {
    /// All applications on the job, regardless of status.
    pub applications: i64,
    /// Applications currently occupying a recruiter slot (selected/working).
    pub selected: i64,
    /// Applications that reached `completed`.
    pub completed: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub status: JobStatus,
    pub reason: &'static str,
}

/// Decide the next automatic transition for a job, if any.
///
/// Completion wins over progress: a hired candidate or a full slot roster
/// closes the job even if it was still `open`. Progress transitions only
/// fire from `open`, so a manually paused or archived job stays put.
pub fn advance_job(status: JobStatus, counts: &JobCounts, max_applications: i64) -> Option<Transition> {
    if counts.completed > 0 && status != JobStatus::Completed {
        return Some(Transition {
            status: JobStatus::Completed,
            reason: "A suitable candidate has been found",
        });
    }

    if counts.selected >= RECRUITER_SLOTS && status != JobStatus::Completed {
        return Some(Transition {
            status: JobStatus::Completed,
            reason: "All recruiter slots are filled",
        });
    }

    if counts.selected > 0 && status == JobStatus::Open {
        return Some(Transition {
            status: JobStatus::InProgress,
            reason: "Recruiters have started working on this job",
        });
    }

    if counts.applications >= max_applications && status == JobStatus::Open {
        return Some(Transition {
            status: JobStatus::InProgress,
            reason: "Application limit reached",
        });
    }

    None
}

/// Whether one more application may move into a slot state, given how many
/// *other* applications on the job already hold one.
pub fn slot_available(other_selected: i64) -> bool {
    other_selected < RECRUITER_SLOTS
}

/// Recruiter-facing wording for an application status change notification.
pub fn application_status_message(status: ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Pending => "is under review",
        ApplicationStatus::Selected => "has been selected for the job",
        ApplicationStatus::Working => "is now in progress",
        ApplicationStatus::Completed => "has been completed successfully",
        ApplicationStatus::Rejected => "has been declined",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(applications: i64, selected: i64, completed: i64) -> JobCounts {
        JobCounts { applications, selected, completed }
    }

    #[test]
    fn completed_application_closes_the_job() {
        let t = advance_job(JobStatus::InProgress, &counts(3, 1, 1), 3).unwrap();
        assert_eq!(t.status, JobStatus::Completed);

        // fires from open too
        let t = advance_job(JobStatus::Open, &counts(1, 0, 1), 3).unwrap();
        assert_eq!(t.status, JobStatus::Completed);
    }

    #[test]
    fn full_slot_roster_closes_the_job() {
        let t = advance_job(JobStatus::InProgress, &counts(3, 3, 0), 3).unwrap();
        assert_eq!(t.status, JobStatus::Completed);
        assert_eq!(t.reason, "All recruiter slots are filled");
    }

    #[test]
    fn first_selection_moves_open_to_in_progress() {
        let t = advance_job(JobStatus::Open, &counts(2, 1, 0), 3).unwrap();
        assert_eq!(t.status, JobStatus::InProgress);

        // but an already in_progress job stays put
        assert!(advance_job(JobStatus::InProgress, &counts(2, 1, 0), 3).is_none());
    }

    #[test]
    fn application_limit_moves_open_to_in_progress() {
        let t = advance_job(JobStatus::Open, &counts(3, 0, 0), 3).unwrap();
        assert_eq!(t.status, JobStatus::InProgress);
        assert_eq!(t.reason, "Application limit reached");
    }

    #[test]
    fn quiet_jobs_do_not_move() {
        assert!(advance_job(JobStatus::Open, &counts(1, 0, 0), 3).is_none());
        assert!(advance_job(JobStatus::Paused, &counts(3, 0, 0), 3).is_none());
        assert!(advance_job(JobStatus::Completed, &counts(3, 3, 1), 3).is_none());
    }

    #[test]
    fn slot_guard() {
        assert!(slot_available(0));
        assert!(slot_available(2));
        assert!(!slot_available(3));
        assert!(!slot_available(4));
    }
}

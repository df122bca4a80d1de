use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use kadra_core::lifecycle::{self, JobCounts};
use kadra_types::models::{ApplicationStatus, JobStatus, NotificationKind};

use crate::models::{ApplicationRow, JobRow, NewNotification, UserRow};
use crate::queries::jobs::{job_by_id, notify_job_applicants};
use crate::queries::{
    APPLICATION_COLS, JOB_COLS, USER_COLS, map_application, map_user, notifications,
};
use crate::{Database, Result, StoreError};

impl Database {
    /// Recruiter applies to a job. The whole operation — guards, insert,
    /// automatic job transition, notifications — is one transaction.
    pub fn apply_to_job(
        &self,
        application_id: &str,
        job_id: &str,
        recruiter_id: &str,
        recruiter_name: &str,
        cover_letter: &str,
    ) -> Result<ApplicationRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let job = job_by_id(&tx, job_id)?.ok_or(StoreError::NotFound("job"))?;
            if job.status != JobStatus::Open {
                return Err(StoreError::JobNotOpen);
            }

            let counts = job_counts(&tx, job_id)?;
            if counts.applications >= job.max_applications {
                return Err(StoreError::ApplicationLimit);
            }

            let duplicate: Option<String> = tx
                .query_row(
                    "SELECT id FROM applications WHERE job_id = ?1 AND recruiter_id = ?2",
                    params![job_id, recruiter_id],
                    |row| row.get(0),
                )
                .optional()?;
            if duplicate.is_some() {
                return Err(StoreError::AlreadyApplied);
            }

            tx.execute(
                "INSERT INTO applications (id, job_id, recruiter_id, cover_letter, status)
                 VALUES (?1, ?2, ?3, ?4, 'pending')",
                params![application_id, job_id, recruiter_id, cover_letter],
            )?;

            let counts = job_counts(&tx, job_id)?;
            apply_job_transition(&tx, &job, &counts, None)?;

            notifications::insert(
                &tx,
                &NewNotification {
                    user_id: &job.employer_id,
                    kind: NotificationKind::NewApplication,
                    title: format!("New application for '{}'", job.title),
                    message: format!("Recruiter {recruiter_name} applied to your job"),
                    job_id: Some(job_id),
                    actor_id: Some(recruiter_id),
                    application_id: Some(application_id),
                    payment_id: None,
                },
            )?;

            let created =
                application_by_id(&tx, application_id)?.ok_or(StoreError::NotFound("application"))?;
            tx.commit()?;

            debug!(job_id, application_id, "application submitted");
            Ok(created)
        })
    }

    /// Employer moves an application through its lifecycle. The
    /// recruiter-slot guard, the update, the job cascade, and the
    /// notifications commit atomically, so the cap of concurrently
    /// selected recruiters holds even under concurrent requests.
    pub fn set_application_status(
        &self,
        application_id: &str,
        employer_id: &str,
        new_status: ApplicationStatus,
    ) -> Result<(ApplicationRow, JobRow)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let application = application_by_id(&tx, application_id)?
                .ok_or(StoreError::NotFound("application"))?;
            let job = job_by_id(&tx, &application.job_id)?.ok_or(StoreError::NotFound("job"))?;
            if job.employer_id != employer_id {
                return Err(StoreError::Forbidden);
            }

            if new_status.occupies_slot() {
                let others = selected_count_excluding(&tx, &job.id, application_id)?;
                if !lifecycle::slot_available(others) {
                    return Err(StoreError::RecruiterCap);
                }
            }

            tx.execute(
                "UPDATE applications SET status = ?2, updated_at = datetime('now') WHERE id = ?1",
                params![application_id, new_status.as_str()],
            )?;

            let counts = job_counts(&tx, &job.id)?;
            let winner = (new_status == ApplicationStatus::Completed).then_some(application_id);
            apply_job_transition(&tx, &job, &counts, winner)?;

            notifications::insert(
                &tx,
                &NewNotification {
                    user_id: &application.recruiter_id,
                    kind: NotificationKind::ApplicationStatusChange,
                    title: "Your application status changed".to_string(),
                    message: format!(
                        "Your application for '{}' {}",
                        job.title,
                        lifecycle::application_status_message(new_status)
                    ),
                    job_id: Some(&job.id),
                    actor_id: Some(employer_id),
                    application_id: Some(application_id),
                    payment_id: None,
                },
            )?;

            let application =
                application_by_id(&tx, application_id)?.ok_or(StoreError::NotFound("application"))?;
            let job = job_by_id(&tx, &job.id)?.ok_or(StoreError::NotFound("job"))?;
            tx.commit()?;
            Ok((application, job))
        })
    }

    pub fn get_application(&self, id: &str) -> Result<Option<ApplicationRow>> {
        self.with_conn(|conn| application_by_id(conn, id))
    }

    pub fn list_applications_for_job(&self, job_id: &str) -> Result<Vec<ApplicationRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {APPLICATION_COLS} FROM applications
                 WHERE job_id = ?1 ORDER BY created_at ASC, rowid ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([job_id], map_application)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_applications_by_recruiter(
        &self,
        recruiter_id: &str,
        status: Option<ApplicationStatus>,
        ascending: bool,
    ) -> Result<Vec<(ApplicationRow, JobRow)>> {
        self.with_conn(|conn| {
            let order = if ascending { "ASC" } else { "DESC" };
            let mut sql = format!(
                "SELECT {APPLICATION_COLS}, {job_cols} FROM applications
                 JOIN jobs ON jobs.id = applications.job_id
                 WHERE applications.recruiter_id = ?1",
                job_cols = qualified_job_cols(),
            );
            if status.is_some() {
                sql.push_str(" AND applications.status = ?2");
            }
            sql.push_str(&format!(
                " ORDER BY applications.created_at {order}, applications.rowid {order}"
            ));

            let map = |row: &rusqlite::Row| -> rusqlite::Result<(ApplicationRow, JobRow)> {
                let application = map_application(row)?;
                let job = map_job_offset(row, 6)?;
                Ok((application, job))
            };

            let mut stmt = conn.prepare(&sql)?;
            let rows = match status {
                Some(status) => stmt
                    .query_map(params![recruiter_id, status.as_str()], map)?
                    .collect::<std::result::Result<Vec<_>, _>>()?,
                None => stmt
                    .query_map([recruiter_id], map)?
                    .collect::<std::result::Result<Vec<_>, _>>()?,
            };
            Ok(rows)
        })
    }

    /// Recruiters currently occupying a slot on the job.
    pub fn selected_recruiters(&self, job_id: &str) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {cols} FROM users
                 JOIN applications ON applications.recruiter_id = users.id
                 WHERE applications.job_id = ?1
                   AND applications.status IN ('selected', 'working')
                 ORDER BY applications.created_at ASC, applications.rowid ASC",
                cols = qualified_user_cols(),
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([job_id], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

/// Job columns qualified with the table name for JOIN queries, in
/// `map_job` order.
fn qualified_job_cols() -> String {
    JOB_COLS
        .split(", ")
        .map(|c| format!("jobs.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn qualified_user_cols() -> String {
    USER_COLS
        .split(", ")
        .map(|c| format!("users.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn map_job_offset(row: &rusqlite::Row, offset: usize) -> rusqlite::Result<JobRow> {
    Ok(JobRow {
        id: row.get(offset)?,
        employer_id: row.get(offset + 1)?,
        moderator_id: row.get(offset + 2)?,
        title: row.get(offset + 3)?,
        short_description: row.get(offset + 4)?,
        description: row.get(offset + 5)?,
        requirements: row.get(offset + 6)?,
        benefits: row.get(offset + 7)?,
        location: row.get(offset + 8)?,
        employment_type: row.get(offset + 9)?,
        experience_level: row.get(offset + 10)?,
        salary_min: row.get(offset + 11)?,
        salary_max: row.get(offset + 12)?,
        salary_currency: row.get(offset + 13)?,
        max_applications: row.get(offset + 14)?,
        status: crate::queries::parse_enum(offset + 15, row.get(offset + 15)?)?,
        status_reason: row.get(offset + 16)?,
        moderation_comment: row.get(offset + 17)?,
        moderated_at: row.get(offset + 18)?,
        winner_application_id: row.get(offset + 19)?,
        views_count: row.get(offset + 20)?,
        filled_at: row.get(offset + 21)?,
        created_at: row.get(offset + 22)?,
    })
}

pub(crate) fn application_by_id(conn: &Connection, id: &str) -> Result<Option<ApplicationRow>> {
    let sql = format!("SELECT {APPLICATION_COLS} FROM applications WHERE id = ?1");
    let row = conn.query_row(&sql, [id], map_application).optional()?;
    Ok(row)
}

pub(crate) fn job_counts(conn: &Connection, job_id: &str) -> Result<JobCounts> {
    let (applications, selected, completed) = conn.query_row(
        "SELECT COUNT(*),
                COUNT(CASE WHEN status IN ('selected', 'working') THEN 1 END),
                COUNT(CASE WHEN status = 'completed' THEN 1 END)
         FROM applications WHERE job_id = ?1",
        [job_id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    Ok(JobCounts { applications, selected, completed })
}

pub(crate) fn selected_count_excluding(
    conn: &Connection,
    job_id: &str,
    application_id: &str,
) -> Result<i64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM applications
         WHERE job_id = ?1 AND id != ?2 AND status IN ('selected', 'working')",
        params![job_id, application_id],
        |row| row.get(0),
    )?;
    Ok(n)
}

/// Apply whatever `advance_job` decides for the fresh counts: update the
/// job, stamp `filled_at` (and the winner, when completion came from a
/// completed application), and notify every applicant of the change.
fn apply_job_transition(
    conn: &Connection,
    job: &JobRow,
    counts: &JobCounts,
    winner_application_id: Option<&str>,
) -> Result<()> {
    let Some(transition) = lifecycle::advance_job(job.status, counts, job.max_applications) else {
        return Ok(());
    };

    conn.execute(
        "UPDATE jobs SET status = ?2, status_reason = ?3, updated_at = datetime('now')
         WHERE id = ?1",
        params![job.id, transition.status.as_str(), transition.reason],
    )?;

    if transition.status == JobStatus::Completed {
        conn.execute(
            "UPDATE jobs SET filled_at = COALESCE(filled_at, datetime('now')) WHERE id = ?1",
            [&job.id],
        )?;
        if counts.completed > 0 {
            if let Some(winner) = winner_application_id {
                conn.execute(
                    "UPDATE jobs SET winner_application_id = ?2 WHERE id = ?1",
                    params![job.id, winner],
                )?;
            }
        }
    }

    notify_job_applicants(conn, job, job.status, transition.status, transition.reason, None)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use kadra_types::models::UserRole;

    use super::*;
    use crate::models::NewJob;

    fn new_job(id: &str, employer: &str, salary_min: i64, salary_max: i64) -> NewJob {
        NewJob {
            id: id.into(),
            employer_id: employer.into(),
            title: "Senior backend engineer".into(),
            short_description: Some("Rust services".into()),
            description: "Build and run the core services".into(),
            requirements: None,
            benefits: None,
            location: Some("Almaty".into()),
            employment_type: "full-time".into(),
            experience_level: None,
            salary_min,
            salary_max,
            max_applications: 3,
        }
    }

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user("adm", "admin@k.kz", "Admin", "h", UserRole::Admin).unwrap();
        db.create_user("emp", "emp@k.kz", "Employer", "h", UserRole::Employer).unwrap();
        for i in 1..=4 {
            db.create_user(
                &format!("rec{i}"),
                &format!("rec{i}@k.kz"),
                &format!("Recruiter {i}"),
                "h",
                UserRole::Recruiter,
            )
            .unwrap();
        }
        db
    }

    /// Creates a job, pays for it, approves it — the preamble shared by
    /// most application tests.
    fn open_job(db: &Database, id: &str) {
        db.create_job_with_payment(&new_job(id, "emp", 200_000, 400_000), &format!("pay-{id}"), 210_000.0)
            .unwrap();
        db.complete_payment(id, "emp", "Employer", "card", "TXN_TEST").unwrap();
        db.moderate_job(id, "adm", true, None).unwrap();
    }

    #[test]
    fn duplicate_application_is_rejected() {
        let db = setup();
        open_job(&db, "j1");

        db.apply_to_job("a1", "j1", "rec1", "Recruiter 1", "hi").unwrap();
        let err = db.apply_to_job("a1b", "j1", "rec1", "Recruiter 1", "hi again").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyApplied));

        // still exactly one row
        assert_eq!(db.list_applications_for_job("j1").unwrap().len(), 1);
    }

    #[test]
    fn application_limit_is_enforced() {
        let db = setup();
        open_job(&db, "j1");

        // max_applications is 3; the third application flips the job to
        // in_progress, so a fourth is rejected as not open.
        db.apply_to_job("a1", "j1", "rec1", "Recruiter 1", "hi").unwrap();
        db.apply_to_job("a2", "j1", "rec2", "Recruiter 2", "hi").unwrap();
        db.apply_to_job("a3", "j1", "rec3", "Recruiter 3", "hi").unwrap();

        let job = db.get_job("j1").unwrap().unwrap();
        assert_eq!(job.status, JobStatus::InProgress);

        let err = db.apply_to_job("a4", "j1", "rec4", "Recruiter 4", "hi").unwrap_err();
        assert!(matches!(err, StoreError::JobNotOpen));
    }

    #[test]
    fn recruiter_cap_blocks_fourth_selection() {
        let db = setup();
        open_job(&db, "j1");

        // widen the limit so four applications can coexist
        db.with_conn(|conn| {
            conn.execute("UPDATE jobs SET max_applications = 10 WHERE id = 'j1'", [])?;
            Ok(())
        })
        .unwrap();

        for i in 1..=4 {
            db.apply_to_job(&format!("a{i}"), "j1", &format!("rec{i}"), "R", "hi").unwrap();
        }

        db.set_application_status("a1", "emp", ApplicationStatus::Selected).unwrap();
        db.set_application_status("a2", "emp", ApplicationStatus::Working).unwrap();
        db.set_application_status("a3", "emp", ApplicationStatus::Selected).unwrap();

        let err = db.set_application_status("a4", "emp", ApplicationStatus::Selected).unwrap_err();
        assert!(matches!(err, StoreError::RecruiterCap));

        // moving an already-selected application between slot states is
        // fine; it does not count itself
        db.set_application_status("a1", "emp", ApplicationStatus::Working).unwrap();
    }

    #[test]
    fn only_the_owner_can_change_status() {
        let db = setup();
        db.create_user("emp2", "emp2@k.kz", "Other", "h", UserRole::Employer).unwrap();
        open_job(&db, "j1");
        db.apply_to_job("a1", "j1", "rec1", "Recruiter 1", "hi").unwrap();

        let err = db.set_application_status("a1", "emp2", ApplicationStatus::Selected).unwrap_err();
        assert!(matches!(err, StoreError::Forbidden));
    }

    #[test]
    fn completed_application_completes_job_and_sets_winner() {
        let db = setup();
        open_job(&db, "j1");
        db.apply_to_job("a1", "j1", "rec1", "Recruiter 1", "hi").unwrap();

        db.set_application_status("a1", "emp", ApplicationStatus::Selected).unwrap();
        let (_, job) = db.set_application_status("a1", "emp", ApplicationStatus::Completed).unwrap();

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.winner_application_id.as_deref(), Some("a1"));
        assert!(job.filled_at.is_some());
    }

    #[test]
    fn full_scenario_three_selected_recruiters_complete_the_job() {
        let db = setup();

        // employer creates the job; 200k..400k salary prices at 210000
        let pricing = kadra_core::pricing::PricingConfig::default();
        let price = pricing.posting_price(200_000, 400_000);
        assert_eq!(price, 210_000.0);
        db.create_job_with_payment(&new_job("j1", "emp", 200_000, 400_000), "pay1", price).unwrap();
        assert_eq!(db.get_job("j1").unwrap().unwrap().status, JobStatus::Draft);

        // pays: draft -> pending
        db.complete_payment("j1", "emp", "Employer", "card", "TXN_1").unwrap();
        assert_eq!(db.get_job("j1").unwrap().unwrap().status, JobStatus::Pending);

        // admin approves: pending -> open
        db.moderate_job("j1", "adm", true, None).unwrap();
        assert_eq!(db.get_job("j1").unwrap().unwrap().status, JobStatus::Open);

        // three recruiters apply and each gets selected
        for i in 1..=3 {
            db.apply_to_job(&format!("a{i}"), "j1", &format!("rec{i}"), "R", "hi").unwrap();
        }
        for i in 1..=3 {
            db.set_application_status(&format!("a{i}"), "emp", ApplicationStatus::Selected).unwrap();
        }

        let job = db.get_job("j1").unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        // slot-fill completion has no single winner
        assert!(job.winner_application_id.is_none());

        // every recruiter heard about the job status change
        for i in 1..=3 {
            let kinds: Vec<_> = db
                .list_notifications(&format!("rec{i}"))
                .unwrap()
                .into_iter()
                .map(|n| n.kind)
                .collect();
            assert!(kinds.contains(&NotificationKind::JobStatusChange));
        }
    }
}

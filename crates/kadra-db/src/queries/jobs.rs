use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use kadra_core::lifecycle::JobCounts;
use kadra_types::models::{JobStatus, NotificationKind, PaymentStatus, UserRole};

use crate::models::{JobRow, NewJob, NewNotification};
use crate::queries::applications::job_counts;
use crate::queries::users::count_users_with_role;
use crate::queries::{JOB_COLS, map_job, notifications};
use crate::{Database, Result, StoreError};

/// A listing entry: the job plus the counters derived from its
/// applications.
#[derive(Debug)]
pub struct JobListing {
    pub job: JobRow,
    pub applications_count: i64,
    pub selected_count: i64,
}

#[derive(Debug, Default)]
pub struct JobFilter {
    pub q: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
}

#[derive(Debug)]
pub struct PublicStats {
    pub open_jobs: i64,
    pub total_recruiters: i64,
    pub total_employers: i64,
}

#[derive(Debug)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_jobs: i64,
    pub pending_jobs: i64,
    pub paid_payments: i64,
    pub total_revenue: f64,
    pub pending_jobs_list: Vec<JobRow>,
}

#[derive(Debug)]
pub struct EmployerStats {
    pub total_jobs: i64,
    pub completed_jobs: i64,
    pub open_jobs: i64,
    pub in_progress_jobs: i64,
    pub success_rate: f64,
    pub avg_time_to_fill_days: Option<f64>,
}

impl Database {
    /// Create a draft job together with its pending payment. One
    /// transaction: a job without a payment row would be unpayable.
    pub fn create_job_with_payment(&self, job: &NewJob, payment_id: &str, amount: f64) -> Result<JobRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO jobs (id, employer_id, title, short_description, description,
                     requirements, benefits, location, employment_type, experience_level,
                     salary_min, salary_max, max_applications, status, status_reason)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 'draft', 'Awaiting payment')",
                params![
                    job.id,
                    job.employer_id,
                    job.title,
                    job.short_description,
                    job.description,
                    job.requirements,
                    job.benefits,
                    job.location,
                    job.employment_type,
                    job.experience_level,
                    job.salary_min,
                    job.salary_max,
                    job.max_applications,
                ],
            )?;

            tx.execute(
                "INSERT INTO payments (id, job_id, employer_id, amount, status)
                 VALUES (?1, ?2, ?3, ?4, 'pending')",
                params![payment_id, job.id, job.employer_id, amount],
            )?;

            let created = job_by_id(&tx, &job.id)?.ok_or(StoreError::NotFound("job"))?;
            tx.commit()?;

            debug!(job_id = %job.id, amount, "created draft job with pending payment");
            Ok(created)
        })
    }

    pub fn get_job(&self, id: &str) -> Result<Option<JobRow>> {
        self.with_conn(|conn| job_by_id(conn, id))
    }

    pub fn get_job_with_counts(&self, id: &str) -> Result<Option<(JobRow, JobCounts)>> {
        self.with_conn(|conn| {
            let Some(job) = job_by_id(conn, id)? else {
                return Ok(None);
            };
            let counts = job_counts(conn, id)?;
            Ok(Some((job, counts)))
        })
    }

    pub fn increment_job_views(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE jobs SET views_count = views_count + 1 WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    /// Public listing: open jobs, plus in_progress jobs that still have a
    /// free recruiter slot.
    pub fn list_public_jobs(&self, filter: &JobFilter) -> Result<Vec<JobListing>> {
        self.with_conn(|conn| {
            let mut sql = format!(
                "SELECT {JOB_COLS}, applications_count, selected_count FROM (
                     SELECT {JOB_COLS}, jobs.rowid AS row_order,
                         (SELECT COUNT(*) FROM applications a
                              WHERE a.job_id = jobs.id) AS applications_count,
                         (SELECT COUNT(*) FROM applications a
                              WHERE a.job_id = jobs.id
                                AND a.status IN ('selected', 'working')) AS selected_count
                     FROM jobs
                 )
                 WHERE (status = 'open'
                        OR (status = 'in_progress' AND selected_count < ?1))"
            );

            let cap = kadra_core::lifecycle::RECRUITER_SLOTS;
            let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(cap)];

            if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
                values.push(Box::new(format!("%{}%", q.trim())));
                sql.push_str(&format!(
                    " AND (title LIKE ?{n} OR description LIKE ?{n})",
                    n = values.len()
                ));
            }
            if let Some(min) = filter.salary_min {
                values.push(Box::new(min));
                sql.push_str(&format!(" AND salary_min >= ?{}", values.len()));
            }
            if let Some(max) = filter.salary_max {
                values.push(Box::new(max));
                sql.push_str(&format!(" AND salary_max <= ?{}", values.len()));
            }

            sql.push_str(" ORDER BY created_at DESC, row_order DESC");

            let mut stmt = conn.prepare(&sql)?;
            let param_refs: Vec<&dyn rusqlite::types::ToSql> =
                values.iter().map(|v| v.as_ref()).collect();
            let rows = stmt
                .query_map(param_refs.as_slice(), |row| {
                    Ok(JobListing {
                        job: map_job(row)?,
                        applications_count: row.get(23)?,
                        selected_count: row.get(24)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Admin listing: every job, optionally narrowed to one status.
    pub fn list_all_jobs(&self, status: Option<JobStatus>) -> Result<Vec<JobRow>> {
        self.with_conn(|conn| {
            let rows = match status {
                Some(status) => {
                    let sql = format!(
                        "SELECT {JOB_COLS} FROM jobs WHERE status = ?1
                         ORDER BY created_at DESC, rowid DESC"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    stmt.query_map([status.as_str()], map_job)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
                None => {
                    let sql = format!(
                        "SELECT {JOB_COLS} FROM jobs ORDER BY created_at DESC, rowid DESC"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    stmt.query_map([], map_job)?
                        .collect::<std::result::Result<Vec<_>, _>>()?
                }
            };
            Ok(rows)
        })
    }

    pub fn list_jobs_by_employer(&self, employer_id: &str) -> Result<Vec<JobRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {JOB_COLS} FROM jobs WHERE employer_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([employer_id], map_job)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Employer's manual status override. Bypasses the automatic rules by
    /// design; every applicant gets notified of the change.
    pub fn set_job_status_manual(
        &self,
        job_id: &str,
        employer_id: &str,
        new_status: JobStatus,
        reason: Option<&str>,
    ) -> Result<JobRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let job = job_by_id(&tx, job_id)?.ok_or(StoreError::NotFound("job"))?;
            if job.employer_id != employer_id {
                return Err(StoreError::Forbidden);
            }

            let reason = reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or("Changed by the employer")
                .to_string();

            tx.execute(
                "UPDATE jobs SET status = ?2, status_reason = ?3, updated_at = datetime('now')
                 WHERE id = ?1",
                params![job_id, new_status.as_str(), reason],
            )?;
            if new_status == JobStatus::Completed {
                tx.execute(
                    "UPDATE jobs SET filled_at = COALESCE(filled_at, datetime('now')) WHERE id = ?1",
                    [job_id],
                )?;
            }

            if job.status != new_status {
                notify_job_applicants(&tx, &job, job.status, new_status, &reason, Some(employer_id))?;
            }

            let updated = job_by_id(&tx, job_id)?.ok_or(StoreError::NotFound("job"))?;
            tx.commit()?;
            Ok(updated)
        })
    }

    /// Admin moderation. Only pending jobs can be approved or rejected.
    pub fn moderate_job(
        &self,
        job_id: &str,
        moderator_id: &str,
        approve: bool,
        comment: Option<&str>,
    ) -> Result<JobRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let job = job_by_id(&tx, job_id)?.ok_or(StoreError::NotFound("job"))?;
            if job.status != JobStatus::Pending {
                return Err(StoreError::NotAwaitingModeration);
            }

            if approve {
                let comment = comment.unwrap_or("Job approved");
                tx.execute(
                    "UPDATE jobs SET status = 'open', status_reason = 'Approved by moderation',
                         moderator_id = ?2, moderated_at = datetime('now'), moderation_comment = ?3,
                         updated_at = datetime('now')
                     WHERE id = ?1",
                    params![job_id, moderator_id, comment],
                )?;

                notifications::insert(
                    &tx,
                    &NewNotification {
                        user_id: &job.employer_id,
                        kind: NotificationKind::JobApproved,
                        title: format!("Job '{}' approved!", job.title),
                        message: "Your job passed moderation and is now live on the platform."
                            .to_string(),
                        job_id: Some(job_id),
                        actor_id: None,
                        application_id: None,
                        payment_id: None,
                    },
                )?;
            } else {
                let comment = comment.unwrap_or("Job rejected");
                tx.execute(
                    "UPDATE jobs SET status = 'rejected', status_reason = ?3,
                         moderator_id = ?2, moderated_at = datetime('now'), moderation_comment = ?3,
                         updated_at = datetime('now')
                     WHERE id = ?1",
                    params![job_id, moderator_id, comment],
                )?;

                notifications::insert(
                    &tx,
                    &NewNotification {
                        user_id: &job.employer_id,
                        kind: NotificationKind::JobRejected,
                        title: format!("Job '{}' rejected", job.title),
                        message: format!("Your job did not pass moderation. Reason: {comment}"),
                        job_id: Some(job_id),
                        actor_id: None,
                        application_id: None,
                        payment_id: None,
                    },
                )?;
            }

            let updated = job_by_id(&tx, job_id)?.ok_or(StoreError::NotFound("job"))?;
            tx.commit()?;
            Ok(updated)
        })
    }

    pub fn public_stats(&self) -> Result<PublicStats> {
        self.with_conn(|conn| {
            let open_jobs: i64 = conn.query_row(
                "SELECT COUNT(*) FROM jobs WHERE status = 'open'",
                [],
                |row| row.get(0),
            )?;
            Ok(PublicStats {
                open_jobs,
                total_recruiters: count_users_with_role(conn, UserRole::Recruiter)?,
                total_employers: count_users_with_role(conn, UserRole::Employer)?,
            })
        })
    }

    pub fn admin_stats(&self) -> Result<AdminStats> {
        self.with_conn(|conn| {
            let total_users: i64 =
                conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            let total_jobs: i64 =
                conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
            let pending_jobs: i64 = conn.query_row(
                "SELECT COUNT(*) FROM jobs WHERE status = 'pending'",
                [],
                |row| row.get(0),
            )?;
            let paid_payments: i64 = conn.query_row(
                "SELECT COUNT(*) FROM payments WHERE status = ?1",
                [PaymentStatus::Paid.as_str()],
                |row| row.get(0),
            )?;
            let total_revenue: f64 = conn.query_row(
                "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE status = ?1",
                [PaymentStatus::Paid.as_str()],
                |row| row.get(0),
            )?;

            let sql = format!(
                "SELECT {JOB_COLS} FROM jobs WHERE status = 'pending'
                 ORDER BY created_at DESC, rowid DESC LIMIT 10"
            );
            let mut stmt = conn.prepare(&sql)?;
            let pending_jobs_list = stmt
                .query_map([], map_job)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(AdminStats {
                total_users,
                total_jobs,
                pending_jobs,
                paid_payments,
                total_revenue,
                pending_jobs_list,
            })
        })
    }

    pub fn employer_stats(&self, employer_id: &str) -> Result<EmployerStats> {
        self.with_conn(|conn| {
            let count = |status: &str| -> rusqlite::Result<i64> {
                conn.query_row(
                    "SELECT COUNT(*) FROM jobs WHERE employer_id = ?1 AND status = ?2",
                    params![employer_id, status],
                    |row| row.get(0),
                )
            };

            let total_jobs: i64 = conn.query_row(
                "SELECT COUNT(*) FROM jobs WHERE employer_id = ?1",
                [employer_id],
                |row| row.get(0),
            )?;
            let completed_jobs = count("completed")?;
            let open_jobs = count("open")?;
            let in_progress_jobs = count("in_progress")?;

            let success_rate = if total_jobs > 0 {
                (completed_jobs as f64 / total_jobs as f64 * 1000.0).round() / 10.0
            } else {
                0.0
            };

            let avg_time_to_fill_days: Option<f64> = conn.query_row(
                "SELECT AVG(julianday(filled_at) - julianday(created_at))
                 FROM jobs WHERE employer_id = ?1 AND filled_at IS NOT NULL",
                [employer_id],
                |row| row.get(0),
            )?;

            Ok(EmployerStats {
                total_jobs,
                completed_jobs,
                open_jobs,
                in_progress_jobs,
                success_rate,
                avg_time_to_fill_days: avg_time_to_fill_days.map(|d| (d * 10.0).round() / 10.0),
            })
        })
    }
}

pub(crate) fn job_by_id(conn: &Connection, id: &str) -> Result<Option<JobRow>> {
    let sql = format!("SELECT {JOB_COLS} FROM jobs WHERE id = ?1");
    let row = conn.query_row(&sql, [id], map_job).optional()?;
    Ok(row)
}

/// One notification per recruiter with an application on the job,
/// describing the old and new status and the reason.
pub(crate) fn notify_job_applicants(
    conn: &Connection,
    job: &JobRow,
    old_status: JobStatus,
    new_status: JobStatus,
    reason: &str,
    actor_id: Option<&str>,
) -> Result<()> {
    let mut stmt = conn.prepare("SELECT recruiter_id FROM applications WHERE job_id = ?1")?;
    let recruiter_ids = stmt
        .query_map([&job.id], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    for recruiter_id in recruiter_ids {
        notifications::insert(
            conn,
            &NewNotification {
                user_id: &recruiter_id,
                kind: NotificationKind::JobStatusChange,
                title: format!("Job '{}' status changed", job.title),
                message: format!(
                    "Status changed from '{old_status}' to '{new_status}'. Reason: {reason}"
                ),
                job_id: Some(&job.id),
                actor_id,
                application_id: None,
                payment_id: None,
            },
        )?;
    }
    Ok(())
}

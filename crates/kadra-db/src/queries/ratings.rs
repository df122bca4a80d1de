use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use kadra_types::models::{NotificationKind, UserRole};

use crate::models::{NewNotification, RatingRow, UserRow};
use crate::queries::users::user_by_id;
use crate::queries::{RATING_COLS, USER_COLS, map_rating, map_user, notifications};
use crate::{Database, Result, StoreError};

/// A recruiter's aggregate standing.
#[derive(Debug, Clone, Copy)]
pub struct RatingSummary {
    pub average: f64,
    pub count: i64,
}

/// Leaderboard entry for the public top-recruiters listing.
#[derive(Debug)]
pub struct TopRecruiter {
    pub user: UserRow,
    pub average: f64,
    pub ratings_count: i64,
    pub completed_projects: i64,
}

impl Database {
    /// Rate a recruiter. An employer rates each recruiter at most once;
    /// a repeat call replaces the previous score and comment in place.
    pub fn upsert_rating(
        &self,
        recruiter_id: &str,
        employer_id: &str,
        job_id: Option<&str>,
        rating: f64,
        comment: Option<&str>,
    ) -> Result<RatingRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let recruiter =
                user_by_id(&tx, recruiter_id)?.ok_or(StoreError::NotFound("user"))?;
            if recruiter.role != UserRole::Recruiter {
                return Err(StoreError::NotFound("recruiter"));
            }
            let employer = user_by_id(&tx, employer_id)?.ok_or(StoreError::NotFound("user"))?;

            tx.execute(
                "INSERT INTO recruiter_ratings (id, recruiter_id, employer_id, job_id, rating, comment)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(recruiter_id, employer_id) DO UPDATE SET
                     rating = excluded.rating,
                     comment = excluded.comment,
                     job_id = excluded.job_id,
                     updated_at = datetime('now')",
                params![
                    Uuid::new_v4().to_string(),
                    recruiter_id,
                    employer_id,
                    job_id,
                    rating,
                    comment
                ],
            )?;

            notifications::insert(
                &tx,
                &NewNotification {
                    user_id: recruiter_id,
                    kind: NotificationKind::NewRating,
                    title: format!("{} rated your work", employer.name),
                    message: format!("You received a rating of {rating}"),
                    job_id,
                    actor_id: Some(employer_id),
                    application_id: None,
                    payment_id: None,
                },
            )?;

            let sql = format!(
                "SELECT {RATING_COLS} FROM recruiter_ratings
                 WHERE recruiter_id = ?1 AND employer_id = ?2"
            );
            let row = tx
                .query_row(&sql, params![recruiter_id, employer_id], map_rating)
                .optional()?
                .ok_or(StoreError::NotFound("rating"))?;
            tx.commit()?;
            Ok(row)
        })
    }

    /// Ratings left for a recruiter, newest first, with the employer's
    /// display name.
    pub fn list_ratings_for_recruiter(
        &self,
        recruiter_id: &str,
    ) -> Result<Vec<(RatingRow, String)>> {
        self.with_conn(|conn| {
            let cols = RATING_COLS
                .split(", ")
                .map(|c| format!("r.{}", c.trim()))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT {cols}, users.name FROM recruiter_ratings r
                 JOIN users ON users.id = r.employer_id
                 WHERE r.recruiter_id = ?1
                 ORDER BY r.created_at DESC, r.rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([recruiter_id], |row| Ok((map_rating(row)?, row.get(7)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn rating_summary(&self, recruiter_id: &str) -> Result<RatingSummary> {
        self.with_conn(|conn| avg_and_count(conn, recruiter_id))
    }

    /// Leaderboard: rated recruiters ordered by average, ties broken by
    /// how many ratings they earned.
    pub fn top_recruiters(&self, limit: i64) -> Result<Vec<TopRecruiter>> {
        self.with_conn(|conn| {
            let cols = USER_COLS
                .split(", ")
                .map(|c| format!("users.{}", c.trim()))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT {cols},
                     AVG(r.rating) AS average,
                     COUNT(r.id) AS ratings_count,
                     COUNT(r.job_id) AS completed_projects
                 FROM users
                 JOIN recruiter_ratings r ON r.recruiter_id = users.id
                 WHERE users.role = 'recruiter'
                 GROUP BY users.id
                 ORDER BY average DESC, ratings_count DESC
                 LIMIT ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([limit], |row| {
                    let average: f64 = row.get(20)?;
                    Ok(TopRecruiter {
                        user: map_user(row)?,
                        average: (average * 10.0).round() / 10.0,
                        ratings_count: row.get(21)?,
                        completed_projects: row.get(22)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

/// Average rating rounded to one decimal, plus how many ratings exist.
pub(crate) fn avg_and_count(conn: &Connection, recruiter_id: &str) -> Result<RatingSummary> {
    let (average, count): (Option<f64>, i64) = conn.query_row(
        "SELECT AVG(rating), COUNT(*) FROM recruiter_ratings WHERE recruiter_id = ?1",
        [recruiter_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(RatingSummary {
        average: average.map(|a| (a * 10.0).round() / 10.0).unwrap_or(0.0),
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user("emp1", "e1@k.kz", "Employer One", "h", UserRole::Employer).unwrap();
        db.create_user("emp2", "e2@k.kz", "Employer Two", "h", UserRole::Employer).unwrap();
        db.create_user("rec1", "r1@k.kz", "Recruiter One", "h", UserRole::Recruiter).unwrap();
        db.create_user("rec2", "r2@k.kz", "Recruiter Two", "h", UserRole::Recruiter).unwrap();
        db
    }

    #[test]
    fn repeat_rating_replaces_in_place() {
        let db = setup();

        db.upsert_rating("rec1", "emp1", None, 3.0, Some("okay")).unwrap();
        let updated = db.upsert_rating("rec1", "emp1", None, 5.0, Some("actually great")).unwrap();
        assert_eq!(updated.rating, 5.0);
        assert_eq!(updated.comment.as_deref(), Some("actually great"));

        let summary = db.rating_summary("rec1").unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.average, 5.0);
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        let db = setup();
        db.upsert_rating("rec1", "emp1", None, 5.0, None).unwrap();
        db.upsert_rating("rec1", "emp2", None, 4.0, None).unwrap();

        let summary = db.rating_summary("rec1").unwrap();
        assert_eq!(summary.average, 4.5);
        assert_eq!(summary.count, 2);

        // unrated recruiter reads as zero
        let empty = db.rating_summary("rec2").unwrap();
        assert_eq!(empty.average, 0.0);
        assert_eq!(empty.count, 0);
    }

    #[test]
    fn leaderboard_orders_by_average_then_count() {
        let db = setup();
        db.upsert_rating("rec1", "emp1", None, 4.0, None).unwrap();
        db.upsert_rating("rec1", "emp2", None, 4.0, None).unwrap();
        db.upsert_rating("rec2", "emp1", None, 4.0, None).unwrap();

        let top = db.top_recruiters(10).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].user.id, "rec1");
        assert_eq!(top[0].ratings_count, 2);
        assert_eq!(top[1].user.id, "rec2");
    }

    #[test]
    fn only_recruiters_can_be_rated() {
        let db = setup();
        let err = db.upsert_rating("emp2", "emp1", None, 5.0, None).unwrap_err();
        assert!(matches!(err, StoreError::NotFound("recruiter")));
    }
}

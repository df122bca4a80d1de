use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::models::{NewNotification, NotificationRow};
use crate::queries::{NOTIFICATION_COLS, map_notification};
use crate::{Database, Result};

/// Insert one notification row. No retries, no delivery channel — the
/// in-app record is the whole mechanism. Called from inside the
/// transactions that produce the event.
pub(crate) fn insert(conn: &Connection, n: &NewNotification) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO notifications (id, user_id, kind, title, message,
             related_job_id, related_user_id, related_application_id, related_payment_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            Uuid::new_v4().to_string(),
            n.user_id,
            n.kind.as_str(),
            n.title,
            n.message,
            n.job_id,
            n.actor_id,
            n.application_id,
            n.payment_id,
        ],
    )?;
    Ok(())
}

impl Database {
    pub fn list_notifications(&self, user_id: &str) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {NOTIFICATION_COLS} FROM notifications
                 WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_notification)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn unread_notifications_count(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND is_read = 0",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    /// Returns false when the notification does not exist or belongs to
    /// someone else.
    pub fn mark_notification_read(&self, notification_id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1, read_at = datetime('now')
                 WHERE id = ?1 AND user_id = ?2 AND is_read = 0",
                params![notification_id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Marks every unread notification owned by the user; returns how many
    /// rows flipped.
    pub fn mark_all_notifications_read(&self, user_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1, read_at = datetime('now')
                 WHERE user_id = ?1 AND is_read = 0",
                [user_id],
            )?;
            Ok(changed)
        })
    }
}

#[cfg(test)]
mod tests {
    use kadra_types::models::{NotificationKind, UserRole};

    use super::*;

    fn notify(db: &Database, user_id: &str, title: &str) {
        db.with_conn(|conn| {
            insert(
                conn,
                &NewNotification {
                    user_id,
                    kind: NotificationKind::NewMessage,
                    title: title.into(),
                    message: "hello".into(),
                    job_id: None,
                    actor_id: None,
                    application_id: None,
                    payment_id: None,
                },
            )?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn read_all_only_touches_own_rows() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u1", "a@k.kz", "A", "h", UserRole::Recruiter).unwrap();
        db.create_user("u2", "b@k.kz", "B", "h", UserRole::Recruiter).unwrap();

        notify(&db, "u1", "one");
        notify(&db, "u1", "two");
        notify(&db, "u2", "theirs");

        assert_eq!(db.unread_notifications_count("u1").unwrap(), 2);
        assert_eq!(db.mark_all_notifications_read("u1").unwrap(), 2);
        assert_eq!(db.unread_notifications_count("u1").unwrap(), 0);

        // the other user's row is untouched
        assert_eq!(db.unread_notifications_count("u2").unwrap(), 1);

        // repeat flips nothing
        assert_eq!(db.mark_all_notifications_read("u1").unwrap(), 0);
    }

    #[test]
    fn newest_notification_comes_first() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u1", "a@k.kz", "A", "h", UserRole::Recruiter).unwrap();

        // rows land within the same second; insertion order must still win
        notify(&db, "u1", "first");
        notify(&db, "u1", "second");
        notify(&db, "u1", "third");

        let titles: Vec<_> = db
            .list_notifications("u1")
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
    }

    #[test]
    fn single_read_checks_ownership() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u1", "a@k.kz", "A", "h", UserRole::Recruiter).unwrap();
        db.create_user("u2", "b@k.kz", "B", "h", UserRole::Recruiter).unwrap();
        notify(&db, "u1", "mine");

        let id = db.list_notifications("u1").unwrap()[0].id.clone();
        assert!(!db.mark_notification_read(&id, "u2").unwrap());
        assert!(db.mark_notification_read(&id, "u1").unwrap());
    }
}

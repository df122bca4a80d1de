use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use kadra_types::models::UserRole;

use crate::models::{ProfileUpdate, UserRow};
use crate::queries::{USER_COLS, map_user};
use crate::{Database, Result, StoreError};

impl Database {
    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        name: &str,
        password_hash: &str,
        role: UserRole,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, name, password, role) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, email, name, password_hash, role.as_str()],
            )
            .map_err(|err| match err {
                // the UNIQUE(email) constraint is the authority; a losing
                // concurrent insert gets the same error as a pre-check hit
                rusqlite::Error::SqliteFailure(e, _)
                    if e.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    StoreError::EmailTaken
                }
                other => StoreError::Db(other),
            })?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| user_by_email(conn, email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| user_by_id(conn, id))
    }

    pub fn touch_last_login(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET last_login = datetime('now') WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }

    /// Persist a profile edit. Common fields always apply; recruiter and
    /// employer fields only stick for the matching role.
    pub fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let user = user_by_id(&tx, user_id)?.ok_or(StoreError::NotFound("user"))?;

            tx.execute(
                "UPDATE users SET name = ?2, phone = ?3, location = ?4, bio = ?5,
                     updated_at = datetime('now')
                 WHERE id = ?1",
                params![user_id, update.name, update.phone, update.location, update.bio],
            )?;

            match user.role {
                UserRole::Recruiter => {
                    tx.execute(
                        "UPDATE users SET experience = ?2, specialization = ?3,
                             portfolio_url = ?4, resume_url = ?5
                         WHERE id = ?1",
                        params![
                            user_id,
                            update.experience,
                            update.specialization,
                            update.portfolio_url,
                            update.resume_url
                        ],
                    )?;
                }
                UserRole::Employer => {
                    tx.execute(
                        "UPDATE users SET company = ?2, company_description = ?3, website = ?4
                         WHERE id = ?1",
                        params![user_id, update.company, update.company_description, update.website],
                    )?;
                }
                UserRole::Admin => {}
            }

            let updated = user_by_id(&tx, user_id)?.ok_or(StoreError::NotFound("user"))?;
            tx.commit()?;
            Ok(updated)
        })
    }

    /// Seed the default admin account if no admin exists yet.
    /// Returns true when an account was created.
    pub fn ensure_default_admin(
        &self,
        id: &str,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: i64 = tx.query_row(
                "SELECT COUNT(*) FROM users WHERE role = 'admin'",
                [],
                |row| row.get(0),
            )?;
            if existing > 0 {
                return Ok(false);
            }

            tx.execute(
                "INSERT INTO users (id, email, name, password, role) VALUES (?1, ?2, ?3, ?4, 'admin')",
                params![id, email, name, password_hash],
            )?;
            tx.commit()?;

            info!("Seeded default admin account {}", email);
            Ok(true)
        })
    }
}

pub(crate) fn user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLS} FROM users WHERE email = ?1");
    let row = conn.query_row(&sql, [email], map_user).optional()?;
    Ok(row)
}

pub(crate) fn user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLS} FROM users WHERE id = ?1");
    let row = conn.query_row(&sql, [id], map_user).optional()?;
    Ok(row)
}

pub(crate) fn admin_ids(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT id FROM users WHERE role = 'admin'")?;
    let ids = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(ids)
}

pub(crate) fn count_users_with_role(conn: &Connection, role: UserRole) -> Result<i64> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = ?1",
        [role.as_str()],
        |row| row.get(0),
    )?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_admin_seeded_once() {
        let db = Database::open_in_memory().unwrap();

        assert!(db.ensure_default_admin("a1", "admin@kadra.kz", "Admin", "hash").unwrap());
        // second call is a no-op while any admin exists
        assert!(!db.ensure_default_admin("a2", "other@kadra.kz", "Admin", "hash").unwrap());

        let admin = db.get_user_by_email("admin@kadra.kz").unwrap().unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert!(db.get_user_by_email("other@kadra.kz").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_a_typed_conflict() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u1", "dup@kadra.kz", "First", "hash", UserRole::Employer).unwrap();

        let err = db
            .create_user("u2", "dup@kadra.kz", "Second", "hash", UserRole::Recruiter)
            .unwrap_err();
        assert!(matches!(err, StoreError::EmailTaken));
    }

    #[test]
    fn profile_update_respects_role() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("r1", "rec@kadra.kz", "Rita", "hash", UserRole::Recruiter).unwrap();

        let update = ProfileUpdate {
            name: "Rita R.".into(),
            phone: Some("+7 700 000 00 00".into()),
            specialization: Some("IT hiring".into()),
            company: Some("should not stick".into()),
            ..Default::default()
        };
        let user = db.update_profile("r1", &update).unwrap();

        assert_eq!(user.name, "Rita R.");
        assert_eq!(user.specialization.as_deref(), Some("IT hiring"));
        // employer field ignored for a recruiter
        assert!(user.company.is_none());
    }
}

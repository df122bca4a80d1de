use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use kadra_types::models::{MessageType, NotificationKind, UserRole};

use crate::models::{ApplicationRow, ChatFileRow, JobRow, MessageRow, NewNotification};
use crate::queries::applications::application_by_id;
use crate::queries::jobs::job_by_id;
use crate::queries::users::user_by_id;
use crate::queries::{CHAT_FILE_COLS, MESSAGE_COLS, map_chat_file, map_message, notifications};
use crate::{Database, Result, StoreError};

/// A chat line together with the sender's display name.
#[derive(Debug)]
pub struct ChatEntry {
    pub message: MessageRow,
    pub sender_name: String,
}

impl Database {
    /// Post a text message into an application chat. The sender must be
    /// the recruiter on the application or the employer who owns the job;
    /// the other party is the recipient.
    pub fn send_application_message(
        &self,
        application_id: &str,
        sender_id: &str,
        content: &str,
    ) -> Result<MessageRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let (application, job) = chat_context(&tx, application_id)?;
            let recipient_id = counterpart(&application, &job, sender_id)?;

            let message = insert_message(
                &tx,
                sender_id,
                &recipient_id,
                Some(application_id),
                content,
                MessageType::Text,
            )?;
            notify_new_message(&tx, &message, Some(&job))?;

            tx.commit()?;
            Ok(message)
        })
    }

    /// Chat history, oldest first. Participants and admins only. Opening
    /// the thread counts as reading it, so messages addressed to the
    /// caller are marked read before the rows come back.
    pub fn list_application_messages(
        &self,
        application_id: &str,
        user_id: &str,
    ) -> Result<Vec<ChatEntry>> {
        self.with_conn(|conn| {
            let (application, job) = chat_context(conn, application_id)?;
            ensure_can_read(conn, &application, &job, user_id)?;

            conn.execute(
                "UPDATE messages SET is_read = 1, read_at = datetime('now')
                 WHERE application_id = ?1 AND recipient_id = ?2 AND is_read = 0",
                params![application_id, user_id],
            )?;

            let sql = format!(
                "SELECT {cols}, users.name FROM messages
                 JOIN users ON users.id = messages.sender_id
                 WHERE messages.application_id = ?1
                 ORDER BY messages.created_at ASC, messages.rowid ASC",
                cols = qualified_message_cols(),
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([application_id], |row| {
                    Ok(ChatEntry { message: map_message(row)?, sender_name: row.get(8)? })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Mark every message addressed to the user in this chat as read;
    /// returns how many rows flipped.
    pub fn mark_application_read(&self, application_id: &str, user_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let (application, job) = chat_context(conn, application_id)?;
            ensure_can_read(conn, &application, &job, user_id)?;

            let changed = conn.execute(
                "UPDATE messages SET is_read = 1, read_at = datetime('now')
                 WHERE application_id = ?1 AND recipient_id = ?2 AND is_read = 0",
                params![application_id, user_id],
            )?;
            Ok(changed)
        })
    }

    pub fn unread_application_count(&self, application_id: &str, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let (application, job) = chat_context(conn, application_id)?;
            ensure_can_read(conn, &application, &job, user_id)?;

            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages
                 WHERE application_id = ?1 AND recipient_id = ?2 AND is_read = 0",
                params![application_id, user_id],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }

    /// A message outside any application chat, user to user.
    pub fn send_direct_message(
        &self,
        sender_id: &str,
        recipient_id: &str,
        content: &str,
    ) -> Result<MessageRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            user_by_id(&tx, recipient_id)?.ok_or(StoreError::NotFound("user"))?;
            let message =
                insert_message(&tx, sender_id, recipient_id, None, content, MessageType::Text)?;
            notify_new_message(&tx, &message, None)?;

            tx.commit()?;
            Ok(message)
        })
    }

    pub fn list_sent_messages(&self, user_id: &str) -> Result<Vec<MessageRow>> {
        self.list_messages("sender_id", user_id)
    }

    pub fn list_received_messages(&self, user_id: &str) -> Result<Vec<MessageRow>> {
        self.list_messages("recipient_id", user_id)
    }

    fn list_messages(&self, column: &str, user_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLS} FROM messages
                 WHERE {column} = ?1 ORDER BY created_at DESC, rowid DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Attach a file to an application chat: a `file` message plus the
    /// file record, in one transaction. The caller has already written
    /// the bytes to `file_path`.
    pub fn insert_chat_file(
        &self,
        file_id: &str,
        application_id: &str,
        sender_id: &str,
        original_name: &str,
        file_path: &str,
        file_size: i64,
        mime_type: Option<&str>,
    ) -> Result<(MessageRow, ChatFileRow)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let (application, job) = chat_context(&tx, application_id)?;
            let recipient_id = counterpart(&application, &job, sender_id)?;

            let message = insert_message(
                &tx,
                sender_id,
                &recipient_id,
                Some(application_id),
                &format!("Attached file: {original_name}"),
                MessageType::File,
            )?;

            tx.execute(
                "INSERT INTO chat_files (id, message_id, original_name, file_path, file_size, mime_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![file_id, message.id, original_name, file_path, file_size, mime_type],
            )?;
            let file = chat_file_by_id(&tx, file_id)?.ok_or(StoreError::NotFound("file"))?;

            notify_new_message(&tx, &message, Some(&job))?;

            tx.commit()?;
            Ok((message, file))
        })
    }

    /// Files attached anywhere in an application chat, oldest first.
    pub fn list_application_files(&self, application_id: &str) -> Result<Vec<ChatFileRow>> {
        self.with_conn(|conn| {
            let cols = CHAT_FILE_COLS
                .split(", ")
                .map(|c| format!("f.{}", c.trim()))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "SELECT {cols} FROM chat_files f
                 JOIN messages m ON m.id = f.message_id
                 WHERE m.application_id = ?1
                 ORDER BY f.created_at ASC, f.rowid ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([application_id], map_chat_file)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_chat_file(&self, file_id: &str) -> Result<Option<(ChatFileRow, MessageRow)>> {
        self.with_conn(|conn| {
            let Some(file) = chat_file_by_id(conn, file_id)? else {
                return Ok(None);
            };
            let sql = format!("SELECT {MESSAGE_COLS} FROM messages WHERE id = ?1");
            let message = conn
                .query_row(&sql, [&file.message_id], map_message)
                .optional()?
                .ok_or(StoreError::NotFound("message"))?;
            Ok(Some((file, message)))
        })
    }
}

fn qualified_message_cols() -> String {
    MESSAGE_COLS
        .split(", ")
        .map(|c| format!("messages.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn chat_context(conn: &Connection, application_id: &str) -> Result<(ApplicationRow, JobRow)> {
    let application =
        application_by_id(conn, application_id)?.ok_or(StoreError::NotFound("application"))?;
    let job = job_by_id(conn, &application.job_id)?.ok_or(StoreError::NotFound("job"))?;
    Ok((application, job))
}

/// The other side of the chat. Errors with Forbidden when the sender is
/// not a participant; admins can read chats but not write into them.
fn counterpart(application: &ApplicationRow, job: &JobRow, sender_id: &str) -> Result<String> {
    if sender_id == application.recruiter_id {
        Ok(job.employer_id.clone())
    } else if sender_id == job.employer_id {
        Ok(application.recruiter_id.clone())
    } else {
        Err(StoreError::Forbidden)
    }
}

fn ensure_can_read(
    conn: &Connection,
    application: &ApplicationRow,
    job: &JobRow,
    user_id: &str,
) -> Result<()> {
    if user_id == application.recruiter_id || user_id == job.employer_id {
        return Ok(());
    }
    let user = user_by_id(conn, user_id)?.ok_or(StoreError::NotFound("user"))?;
    if user.role == UserRole::Admin {
        return Ok(());
    }
    Err(StoreError::Forbidden)
}

fn insert_message(
    conn: &Connection,
    sender_id: &str,
    recipient_id: &str,
    application_id: Option<&str>,
    content: &str,
    message_type: MessageType,
) -> Result<MessageRow> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO messages (id, sender_id, recipient_id, application_id, content, message_type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, sender_id, recipient_id, application_id, content, message_type.as_str()],
    )?;
    let sql = format!("SELECT {MESSAGE_COLS} FROM messages WHERE id = ?1");
    let message = conn
        .query_row(&sql, [&id], map_message)
        .optional()?
        .ok_or(StoreError::NotFound("message"))?;
    Ok(message)
}

fn notify_new_message(conn: &Connection, message: &MessageRow, job: Option<&JobRow>) -> Result<()> {
    let sender = user_by_id(conn, &message.sender_id)?.ok_or(StoreError::NotFound("user"))?;
    notifications::insert(
        conn,
        &NewNotification {
            user_id: &message.recipient_id,
            kind: NotificationKind::NewMessage,
            title: format!("New message from {}", sender.name),
            message: preview(&message.content),
            job_id: job.map(|j| j.id.as_str()),
            actor_id: Some(&message.sender_id),
            application_id: message.application_id.as_deref(),
            payment_id: None,
        },
    )?;
    Ok(())
}

/// First 50 characters of the content, with an ellipsis when truncated.
fn preview(content: &str) -> String {
    let mut short: String = content.chars().take(50).collect();
    if short.len() < content.len() {
        short.push_str("...");
    }
    short
}

fn chat_file_by_id(conn: &Connection, id: &str) -> Result<Option<ChatFileRow>> {
    let sql = format!("SELECT {CHAT_FILE_COLS} FROM chat_files WHERE id = ?1");
    let row = conn.query_row(&sql, [id], map_chat_file).optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewJob;

    fn setup_chat() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user("adm", "a@k.kz", "Admin", "h", UserRole::Admin).unwrap();
        db.create_user("emp", "e@k.kz", "Employer", "h", UserRole::Employer).unwrap();
        db.create_user("rec", "r@k.kz", "Recruiter", "h", UserRole::Recruiter).unwrap();
        db.create_user("out", "o@k.kz", "Outsider", "h", UserRole::Recruiter).unwrap();
        db.create_job_with_payment(
            &NewJob {
                id: "j1".into(),
                employer_id: "emp".into(),
                title: "Backend engineer".into(),
                short_description: None,
                description: "Build services".into(),
                requirements: None,
                benefits: None,
                location: None,
                employment_type: "full-time".into(),
                experience_level: None,
                salary_min: 200_000,
                salary_max: 400_000,
                max_applications: 3,
            },
            "pay1",
            210_000.0,
        )
        .unwrap();
        db.complete_payment("j1", "emp", "Employer", "card", "TXN").unwrap();
        db.moderate_job("j1", "adm", true, None).unwrap();
        db.apply_to_job("app1", "j1", "rec", "Recruiter", "hi").unwrap();
        db
    }

    #[test]
    fn chat_flows_between_participants() {
        let db = setup_chat();

        db.send_application_message("app1", "rec", "Hello, I have candidates").unwrap();
        db.send_application_message("app1", "emp", "Great, send them over").unwrap();

        let history = db.list_application_messages("app1", "rec").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sender_name, "Recruiter");
        assert_eq!(history[1].message.recipient_id, "rec");

        // admin may read but not write
        assert_eq!(db.list_application_messages("app1", "adm").unwrap().len(), 2);
        let err = db.send_application_message("app1", "adm", "barging in").unwrap_err();
        assert!(matches!(err, StoreError::Forbidden));

        // a stranger gets nothing
        let err = db.list_application_messages("app1", "out").unwrap_err();
        assert!(matches!(err, StoreError::Forbidden));
    }

    #[test]
    fn unread_tracking_is_per_recipient() {
        let db = setup_chat();
        db.send_application_message("app1", "rec", "one").unwrap();
        db.send_application_message("app1", "rec", "two").unwrap();
        db.send_application_message("app1", "emp", "reply").unwrap();

        assert_eq!(db.unread_application_count("app1", "emp").unwrap(), 2);
        assert_eq!(db.unread_application_count("app1", "rec").unwrap(), 1);

        assert_eq!(db.mark_application_read("app1", "emp").unwrap(), 2);
        assert_eq!(db.unread_application_count("app1", "emp").unwrap(), 0);
        // the recruiter's unread message is untouched
        assert_eq!(db.unread_application_count("app1", "rec").unwrap(), 1);
    }

    #[test]
    fn fetching_history_marks_reader_messages_read() {
        let db = setup_chat();
        db.send_application_message("app1", "rec", "ping").unwrap();
        assert_eq!(db.unread_application_count("app1", "emp").unwrap(), 1);

        let history = db.list_application_messages("app1", "emp").unwrap();
        assert!(history[0].message.is_read);
        assert_eq!(db.unread_application_count("app1", "emp").unwrap(), 0);

        // the sender's own unread state is untouched
        db.send_application_message("app1", "emp", "pong").unwrap();
        db.list_application_messages("app1", "emp").unwrap();
        assert_eq!(db.unread_application_count("app1", "rec").unwrap(), 1);
    }

    #[test]
    fn message_notification_preview_is_truncated() {
        let db = setup_chat();
        let long = "x".repeat(80);
        db.send_application_message("app1", "rec", &long).unwrap();

        let notif = &db.list_notifications("emp").unwrap()[0];
        assert_eq!(notif.kind, NotificationKind::NewMessage);
        assert_eq!(notif.message.len(), 53);
        assert!(notif.message.ends_with("..."));
    }

    #[test]
    fn chat_file_creates_message_and_record() {
        let db = setup_chat();
        let (message, file) = db
            .insert_chat_file("f1", "app1", "rec", "cv.pdf", "/tmp/uploads/f1", 1024, Some("application/pdf"))
            .unwrap();

        assert_eq!(message.message_type, MessageType::File);
        assert_eq!(message.content, "Attached file: cv.pdf");
        assert_eq!(file.original_name, "cv.pdf");

        let (stored_file, stored_message) = db.get_chat_file("f1").unwrap().unwrap();
        assert_eq!(stored_file.message_id, stored_message.id);
        assert_eq!(stored_message.application_id.as_deref(), Some("app1"));
    }

    #[test]
    fn direct_message_requires_existing_recipient() {
        let db = setup_chat();
        let err = db.send_direct_message("rec", "ghost", "anyone there?").unwrap_err();
        assert!(matches!(err, StoreError::NotFound("user")));

        db.send_direct_message("rec", "emp", "off-thread note").unwrap();
        assert_eq!(db.list_received_messages("emp").unwrap().len(), 1);
        assert_eq!(db.list_sent_messages("rec").unwrap().len(), 1);
    }
}

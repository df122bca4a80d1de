use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                  TEXT PRIMARY KEY,
            email               TEXT NOT NULL UNIQUE,
            name                TEXT NOT NULL,
            password            TEXT NOT NULL,
            role                TEXT NOT NULL,
            phone               TEXT,
            location            TEXT,
            bio                 TEXT,
            -- recruiter profile
            experience          TEXT,
            specialization      TEXT,
            portfolio_url       TEXT,
            resume_url          TEXT,
            -- employer profile
            company             TEXT,
            company_description TEXT,
            website             TEXT,
            -- notification preferences (in-app only for now)
            email_notifications INTEGER NOT NULL DEFAULT 1,
            sms_notifications   INTEGER NOT NULL DEFAULT 0,
            push_notifications  INTEGER NOT NULL DEFAULT 1,
            last_login          TEXT,
            created_at          TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS jobs (
            id                      TEXT PRIMARY KEY,
            employer_id             TEXT NOT NULL REFERENCES users(id),
            moderator_id            TEXT REFERENCES users(id),
            title                   TEXT NOT NULL,
            short_description       TEXT,
            description             TEXT NOT NULL,
            requirements            TEXT,
            benefits                TEXT,
            location                TEXT,
            employment_type         TEXT NOT NULL DEFAULT 'full-time',
            experience_level        TEXT,
            salary_min              INTEGER NOT NULL DEFAULT 0,
            salary_max              INTEGER NOT NULL DEFAULT 0,
            salary_currency         TEXT NOT NULL DEFAULT 'KZT',
            max_applications        INTEGER NOT NULL DEFAULT 3,
            status                  TEXT NOT NULL DEFAULT 'draft',
            status_reason           TEXT,
            moderation_comment      TEXT,
            moderated_at            TEXT,
            winner_application_id   TEXT,
            views_count             INTEGER NOT NULL DEFAULT 0,
            filled_at               TEXT,
            created_at              TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at              TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status, created_at);
        CREATE INDEX IF NOT EXISTS idx_jobs_employer ON jobs(employer_id, created_at);

        -- one payment per job
        CREATE TABLE IF NOT EXISTS payments (
            id              TEXT PRIMARY KEY,
            job_id          TEXT NOT NULL UNIQUE REFERENCES jobs(id),
            employer_id     TEXT NOT NULL REFERENCES users(id),
            amount          REAL NOT NULL,
            currency        TEXT NOT NULL DEFAULT 'KZT',
            status          TEXT NOT NULL DEFAULT 'pending',
            payment_method  TEXT,
            transaction_id  TEXT,
            paid_at         TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS applications (
            id              TEXT PRIMARY KEY,
            job_id          TEXT NOT NULL REFERENCES jobs(id),
            recruiter_id    TEXT NOT NULL REFERENCES users(id),
            cover_letter    TEXT,
            status          TEXT NOT NULL DEFAULT 'pending',
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(job_id, recruiter_id)
        );

        CREATE INDEX IF NOT EXISTS idx_applications_job ON applications(job_id, status);
        CREATE INDEX IF NOT EXISTS idx_applications_recruiter ON applications(recruiter_id, created_at);

        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY,
            sender_id       TEXT NOT NULL REFERENCES users(id),
            recipient_id    TEXT NOT NULL REFERENCES users(id),
            application_id  TEXT REFERENCES applications(id),
            content         TEXT NOT NULL,
            message_type    TEXT NOT NULL DEFAULT 'text',
            is_read         INTEGER NOT NULL DEFAULT 0,
            read_at         TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_application ON messages(application_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_messages_recipient ON messages(recipient_id, is_read);

        CREATE TABLE IF NOT EXISTS chat_files (
            id              TEXT PRIMARY KEY,
            message_id      TEXT NOT NULL REFERENCES messages(id),
            original_name   TEXT NOT NULL,
            file_path       TEXT NOT NULL,
            file_size       INTEGER NOT NULL DEFAULT 0,
            mime_type       TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- one rating per (recruiter, employer) pair; updated in place
        CREATE TABLE IF NOT EXISTS recruiter_ratings (
            id              TEXT PRIMARY KEY,
            recruiter_id    TEXT NOT NULL REFERENCES users(id),
            employer_id     TEXT NOT NULL REFERENCES users(id),
            job_id          TEXT REFERENCES jobs(id),
            rating          REAL NOT NULL,
            comment         TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(recruiter_id, employer_id)
        );

        CREATE TABLE IF NOT EXISTS notifications (
            id                      TEXT PRIMARY KEY,
            user_id                 TEXT NOT NULL REFERENCES users(id),
            kind                    TEXT NOT NULL,
            title                   TEXT NOT NULL,
            message                 TEXT NOT NULL,
            is_read                 INTEGER NOT NULL DEFAULT 0,
            related_job_id          TEXT,
            related_user_id         TEXT,
            related_application_id  TEXT,
            related_payment_id      TEXT,
            read_at                 TEXT,
            created_at              TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, is_read, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

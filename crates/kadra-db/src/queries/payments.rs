use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use kadra_types::models::{NotificationKind, PaymentStatus};

use crate::models::{NewNotification, PaymentRow};
use crate::queries::jobs::job_by_id;
use crate::queries::users::admin_ids;
use crate::queries::{PAYMENT_COLS, map_payment, notifications};
use crate::{Database, Result, StoreError};

impl Database {
    pub fn get_payment_for_job(&self, job_id: &str) -> Result<Option<PaymentRow>> {
        self.with_conn(|conn| payment_by_job(conn, job_id))
    }

    /// Settle the pending payment for a job. Marks it paid, moves the job
    /// from draft into moderation, and fans out the notifications: a
    /// receipt to the employer and a review request to every admin.
    pub fn complete_payment(
        &self,
        job_id: &str,
        employer_id: &str,
        employer_name: &str,
        payment_method: &str,
        transaction_id: &str,
    ) -> Result<PaymentRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let job = job_by_id(&tx, job_id)?.ok_or(StoreError::NotFound("job"))?;
            if job.employer_id != employer_id {
                return Err(StoreError::Forbidden);
            }

            let payment =
                payment_by_job(&tx, job_id)?.ok_or(StoreError::NotFound("payment"))?;
            if payment.status != PaymentStatus::Pending {
                return Err(StoreError::PaymentSettled);
            }

            tx.execute(
                "UPDATE payments SET status = 'paid', payment_method = ?2,
                     transaction_id = ?3, paid_at = datetime('now')
                 WHERE id = ?1",
                params![payment.id, payment_method, transaction_id],
            )?;

            tx.execute(
                "UPDATE jobs SET status = 'pending', status_reason = 'Awaiting moderation',
                     updated_at = datetime('now')
                 WHERE id = ?1",
                [job_id],
            )?;

            notifications::insert(
                &tx,
                &NewNotification {
                    user_id: employer_id,
                    kind: NotificationKind::PaymentSuccess,
                    title: "Payment received".to_string(),
                    message: format!(
                        "Your payment of {} {} for '{}' went through. The job was sent to moderation.",
                        payment.amount, payment.currency, job.title
                    ),
                    job_id: Some(job_id),
                    actor_id: None,
                    application_id: None,
                    payment_id: Some(&payment.id),
                },
            )?;

            for admin_id in admin_ids(&tx)? {
                notifications::insert(
                    &tx,
                    &NewNotification {
                        user_id: &admin_id,
                        kind: NotificationKind::NewJob,
                        title: "New job awaiting moderation".to_string(),
                        message: format!("{employer_name} paid for '{}'", job.title),
                        job_id: Some(job_id),
                        actor_id: Some(employer_id),
                        application_id: None,
                        payment_id: Some(&payment.id),
                    },
                )?;
            }

            let settled =
                payment_by_job(&tx, job_id)?.ok_or(StoreError::NotFound("payment"))?;
            tx.commit()?;

            info!(job_id, transaction_id, "payment settled, job sent to moderation");
            Ok(settled)
        })
    }
}

pub(crate) fn payment_by_job(conn: &Connection, job_id: &str) -> Result<Option<PaymentRow>> {
    let sql = format!("SELECT {PAYMENT_COLS} FROM payments WHERE job_id = ?1");
    let row = conn.query_row(&sql, [job_id], map_payment).optional()?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use kadra_types::models::{JobStatus, UserRole};

    use super::*;
    use crate::models::NewJob;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user("adm1", "a1@k.kz", "Admin One", "h", UserRole::Admin).unwrap();
        db.create_user("adm2", "a2@k.kz", "Admin Two", "h", UserRole::Admin).unwrap();
        db.create_user("emp", "emp@k.kz", "Employer", "h", UserRole::Employer).unwrap();
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
        db
    }

    #[test]
    fn payment_moves_job_to_moderation_and_notifies() {
        let db = setup();

        let payment = db.complete_payment("j1", "emp", "Employer", "card", "TXN_1").unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);
        assert!(payment.paid_at.is_some());
        assert_eq!(payment.transaction_id.as_deref(), Some("TXN_1"));

        let job = db.get_job("j1").unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Pending);

        // one receipt for the employer
        let employer_kinds: Vec<_> = db
            .list_notifications("emp")
            .unwrap()
            .into_iter()
            .map(|n| n.kind)
            .collect();
        assert_eq!(employer_kinds, vec![NotificationKind::PaymentSuccess]);

        // one review request per admin
        for admin in ["adm1", "adm2"] {
            let kinds: Vec<_> = db
                .list_notifications(admin)
                .unwrap()
                .into_iter()
                .map(|n| n.kind)
                .collect();
            assert_eq!(kinds, vec![NotificationKind::NewJob]);
        }
    }

    #[test]
    fn settled_payment_cannot_be_paid_again() {
        let db = setup();
        db.complete_payment("j1", "emp", "Employer", "card", "TXN_1").unwrap();

        let err = db.complete_payment("j1", "emp", "Employer", "card", "TXN_2").unwrap_err();
        assert!(matches!(err, StoreError::PaymentSettled));

        // the original transaction id survives
        let payment = db.get_payment_for_job("j1").unwrap().unwrap();
        assert_eq!(payment.transaction_id.as_deref(), Some("TXN_1"));
    }

    #[test]
    fn only_the_job_owner_can_pay() {
        let db = setup();
        db.create_user("emp2", "e2@k.kz", "Other", "h", UserRole::Employer).unwrap();

        let err = db.complete_payment("j1", "emp2", "Other", "card", "TXN_X").unwrap_err();
        assert!(matches!(err, StoreError::Forbidden));
    }
}

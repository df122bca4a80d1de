use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};

use kadra_db::models::PaymentRow;
use kadra_types::api::{Claims, PayRequest, PayResponse, PaymentResponse};
use kadra_types::models::UserRole;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

pub async fn get_payment(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = claims.sub.to_string();
    let is_admin = claims.role == UserRole::Admin;

    let db = state.clone();
    let payment = run_blocking(move || {
        let job = db.db.get_job(&job_id)?.ok_or(kadra_db::StoreError::NotFound("job"))?;
        if job.employer_id != user_id && !is_admin {
            return Err(kadra_db::StoreError::Forbidden);
        }
        db.db
            .get_payment_for_job(&job_id)?
            .ok_or(kadra_db::StoreError::NotFound("payment"))
    })
    .await?;

    Ok(Json(payment_response(payment)))
}

pub async fn pay(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PayRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if claims.role != UserRole::Employer {
        return Err(ApiError::Forbidden);
    }

    let transaction_id = format!("TXN_{}", chrono::Utc::now().format("%Y%m%d%H%M%S"));
    let employer_id = claims.sub.to_string();

    let db = state.clone();
    let (payment, job_status) = run_blocking(move || {
        let employer = db
            .db
            .get_user_by_id(&employer_id)?
            .ok_or(kadra_db::StoreError::NotFound("user"))?;
        let payment = db.db.complete_payment(
            &job_id,
            &employer_id,
            &employer.name,
            &req.payment_method,
            &transaction_id,
        )?;
        let job = db.db.get_job(&job_id)?.ok_or(kadra_db::StoreError::NotFound("job"))?;
        Ok((payment, job.status))
    })
    .await?;

    Ok(Json(PayResponse { payment: payment_response(payment), job_status }))
}

pub(crate) fn payment_response(payment: PaymentRow) -> PaymentResponse {
    PaymentResponse {
        id: payment.id,
        job_id: payment.job_id,
        amount: payment.amount,
        currency: payment.currency,
        status: payment.status,
        payment_method: payment.payment_method,
        transaction_id: payment.transaction_id,
        paid_at: payment.paid_at,
        created_at: payment.created_at,
    }
}

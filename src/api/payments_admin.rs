// src/api/payments_admin.rs

use actix_web::{get, post, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::api::auth::AuthContext;
use crate::api::error_response;
use crate::booking;
use crate::models::Role;
use crate::{db, AppState};

#[get("/payments")]
pub async fn list(state: web::Data<AppState>, auth: web::ReqData<AuthContext>) -> impl Responder {
    if auth.role != Role::Admin {
        return HttpResponse::Forbidden().json(json!({"error": "admin only"}));
    }

    match db::list_payments(&state.pool).await {
        Ok(payments) => HttpResponse::Ok().json(payments),
        Err(e) => {
            log::error!("list payments error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub booking_id: i32,
}

/// Admin settlement: payment `pending -> confirmed`, linked booking marked
/// paid. Re-confirming is a no-op and says so.
#[post("/payments/{id}/confirm")]
pub async fn confirm(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthContext>,
    path: web::Path<i32>,
    payload: web::Json<ConfirmPaymentRequest>,
) -> impl Responder {
    if auth.role != Role::Admin {
        return HttpResponse::Forbidden().json(json!({"error": "admin only"}));
    }

    match booking::confirm_payment(
        &state.pool,
        &state.notifier,
        path.into_inner(),
        payload.booking_id,
    )
    .await
    {
        Ok(outcome) => HttpResponse::Ok().json(json!({
            "booking": outcome.booking,
            "already_confirmed": outcome.already_confirmed,
        })),
        Err(e) => error_response(e),
    }
}

// src/api/bookings.rs
//
// HTTP surface of the booking & payment workflow. Handlers validate and
// authorize, then delegate to `crate::booking`; errors are mapped in one
// place (`api::error_response`).

use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::api::auth::AuthContext;
use crate::api::error_response;
use crate::booking::{self, TravelDetails, UnpaidBookingRequest, WorkflowError};
use crate::models::{BookingStatus, GroupMember, PaymentOption, Pilgrim, Role};
use crate::{db, AppState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct InitiatePaymentRequest {
    pub package_id: i32,
    /// "full" or "deposit".
    pub payment_option: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InitiatePaymentResponse {
    pub reference: String,
    pub checkout_url: String,
    /// Whole currency units to be captured.
    pub amount: i64,
}

#[utoipa::path(
    request_body = InitiatePaymentRequest,
    responses(
        (status = 200, body = InitiatePaymentResponse),
        (status = 400, description = "validation failed"),
        (status = 502, description = "payment gateway unavailable")
    )
)]
#[post("/bookings/initiate")]
pub async fn initiate(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthContext>,
    payload: web::Json<InitiatePaymentRequest>,
) -> impl Responder {
    let Some(option) = PaymentOption::parse(&payload.payment_option) else {
        return HttpResponse::BadRequest()
            .json(json!({"error": "payment_option must be 'full' or 'deposit'"}));
    };

    let user = match db::get_user(&state.pool, auth.user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => return HttpResponse::Unauthorized().finish(),
        Err(e) => {
            log::error!("initiate payment user lookup error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    match booking::initiate_payment(&state.pool, &state.gateway, &user, payload.package_id, option)
        .await
    {
        Ok(initiated) => HttpResponse::Ok().json(InitiatePaymentResponse {
            reference: initiated.reference,
            checkout_url: initiated.checkout_url,
            amount: initiated.amount,
        }),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompletePaymentRequest {
    pub reference: String,
    pub passport_number: Option<String>,
    pub travel_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    #[serde(default)]
    pub pilgrims: Vec<Pilgrim>,
    #[serde(default)]
    pub group_members: Vec<GroupMember>,
}

#[utoipa::path(
    request_body = CompletePaymentRequest,
    responses(
        (status = 200, description = "booking created"),
        (status = 404, description = "unknown reference"),
        (status = 409, description = "reference already used")
    )
)]
#[post("/bookings/complete")]
pub async fn complete(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthContext>,
    payload: web::Json<CompletePaymentRequest>,
) -> impl Responder {
    // Only the pilgrim who opened the intent may complete it.
    match db::get_intent(&state.pool, &payload.reference).await {
        Ok(Some(intent)) if intent.user_id == auth.user_id => {}
        Ok(Some(_)) => {
            return HttpResponse::Forbidden().json(json!({"error": "not your payment"}))
        }
        Ok(None) => return error_response(WorkflowError::NotFound("payment intent")),
        Err(e) => return error_response(WorkflowError::Db(e)),
    }

    let details = TravelDetails {
        passport_number: payload.passport_number.clone(),
        travel_date: payload.travel_date,
        return_date: payload.return_date,
        pilgrims: payload.pilgrims.clone(),
        group_members: payload.group_members.clone(),
    };

    match booking::complete_payment(
        &state.pool,
        &state.gateway,
        &state.notifier,
        &state.mailer,
        &payload.reference,
        &details,
    )
    .await
    {
        Ok(created) => HttpResponse::Ok().json(created),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct CancelPaymentRequest {
    pub reference: String,
}

/// The pilgrim closed the checkout. Nothing was persisted beyond the intent;
/// this marks the attempt terminal.
#[post("/bookings/cancel-payment")]
pub async fn cancel_payment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthContext>,
    payload: web::Json<CancelPaymentRequest>,
) -> impl Responder {
    match db::get_intent(&state.pool, &payload.reference).await {
        Ok(Some(intent)) if intent.user_id == auth.user_id => {}
        Ok(Some(_)) => {
            return HttpResponse::Forbidden().json(json!({"error": "not your payment"}))
        }
        Ok(None) => return error_response(WorkflowError::NotFound("payment intent")),
        Err(e) => return error_response(WorkflowError::Db(e)),
    }

    match booking::cancel_payment(&state.pool, &payload.reference).await {
        Ok(()) => HttpResponse::Ok().json(json!({"cancelled": true})),
        Err(e) => error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct CustomBookingRequest {
    pub package_id: Option<i32>,
    #[serde(default)]
    pub selected_services: serde_json::Value,
    pub passport_number: Option<String>,
    pub travel_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    #[serde(default)]
    pub pilgrims: Vec<Pilgrim>,
    #[serde(default)]
    pub group_members: Vec<GroupMember>,
}

/// Custom-services intake: creates an unpaid pending booking to be quoted by
/// an agent. No gateway involvement.
#[post("/bookings/custom")]
pub async fn create_custom(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthContext>,
    payload: web::Json<CustomBookingRequest>,
) -> impl Responder {
    let user = match db::get_user(&state.pool, auth.user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => return HttpResponse::Unauthorized().finish(),
        Err(e) => {
            log::error!("custom booking user lookup error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let req = UnpaidBookingRequest {
        package_id: payload.package_id,
        selected_services: if payload.selected_services.is_null() {
            json!({})
        } else {
            payload.selected_services.clone()
        },
        passport_number: payload.passport_number.clone(),
        travel_date: payload.travel_date,
        return_date: payload.return_date,
        pilgrims: payload.pilgrims.clone(),
        group_members: payload.group_members.clone(),
    };

    match booking::create_unpaid_booking(&state.pool, &state.notifier, &state.mailer, &user, &req)
        .await
    {
        Ok(created) => HttpResponse::Ok().json(created),
        Err(e) => error_response(e),
    }
}

/// Role-scoped listing: pilgrims see their own bookings, agencies the ones
/// against their packages, admins everything.
#[get("/bookings")]
pub async fn list(state: web::Data<AppState>, auth: web::ReqData<AuthContext>) -> impl Responder {
    let scope = match auth.role {
        Role::Admin => db::BookingScope::All,
        Role::Agency => db::BookingScope::ForAgency(auth.user_id),
        Role::Pilgrim => db::BookingScope::ForUser(auth.user_id),
    };

    match db::list_bookings(&state.pool, &scope).await {
        Ok(bookings) => HttpResponse::Ok().json(bookings),
        Err(e) => {
            log::error!("list bookings error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[patch("/bookings/{id}/status")]
pub async fn update_status(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthContext>,
    path: web::Path<i32>,
    payload: web::Json<UpdateStatusRequest>,
) -> impl Responder {
    let id = path.into_inner();
    let Some(to) = BookingStatus::parse(&payload.status) else {
        return HttpResponse::BadRequest().json(json!({"error": "unknown status"}));
    };

    // Agencies may only move their own bookings; admins any.
    match auth.role {
        Role::Admin => {}
        Role::Agency => match db::get_booking(&state.pool, id).await {
            Ok(Some(b)) if b.agency_id == Some(auth.user_id) => {}
            Ok(Some(_)) => {
                return HttpResponse::Forbidden().json(json!({"error": "not your booking"}))
            }
            Ok(None) => return error_response(WorkflowError::NotFound("booking")),
            Err(e) => return error_response(WorkflowError::Db(e)),
        },
        Role::Pilgrim => {
            return HttpResponse::Forbidden().json(json!({"error": "not allowed"}))
        }
    }

    match booking::change_booking_status(&state.pool, id, to).await {
        Ok(updated) => HttpResponse::Ok().json(updated),
        Err(e) => error_response(e),
    }
}

/// Admin-only hard delete. No cascade, no transition guard.
#[delete("/bookings/{id}")]
pub async fn delete(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthContext>,
    path: web::Path<i32>,
) -> impl Responder {
    if auth.role != Role::Admin {
        return HttpResponse::Forbidden().json(json!({"error": "admin only"}));
    }

    match db::delete_booking(&state.pool, path.into_inner()).await {
        Ok(true) => HttpResponse::Ok().json(json!({"deleted": true})),
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "booking not found"})),
        Err(e) => {
            log::error!("delete booking error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

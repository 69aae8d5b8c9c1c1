pub mod agencies;
pub mod auth;
pub mod bookings;
pub mod dashboard;
pub mod packages;
pub mod payments_admin;

use actix_web::HttpResponse;
use serde_json::json;

use crate::booking::WorkflowError;

/// Single place where workflow errors become HTTP responses. Everything the
/// user can fix is a 400, missing records are 404, duplicate/raced writes
/// are 409, gateway trouble is 502, the rest is a 500 with the detail logged.
pub(crate) fn error_response(e: WorkflowError) -> HttpResponse {
    match e {
        WorkflowError::Validation(msg) => {
            HttpResponse::BadRequest().json(json!({"error": msg}))
        }
        WorkflowError::InvalidTransition { .. } => {
            HttpResponse::BadRequest().json(json!({"error": e.to_string()}))
        }
        WorkflowError::NotFound(what) => {
            HttpResponse::NotFound().json(json!({"error": format!("{what} not found")}))
        }
        WorkflowError::DuplicateReference => {
            HttpResponse::Conflict().json(json!({"error": e.to_string()}))
        }
        WorkflowError::Conflict(_) => {
            HttpResponse::Conflict().json(json!({"error": e.to_string()}))
        }
        WorkflowError::PaymentInfrastructure(msg) => {
            log::error!("payment infrastructure error: {msg}");
            HttpResponse::BadGateway().json(json!({"error": "payment gateway unavailable"}))
        }
        WorkflowError::BookingPersistence(err) => {
            log::error!("booking persistence error after capture: {err}");
            HttpResponse::InternalServerError()
                .json(json!({"error": "booking could not be recorded"}))
        }
        WorkflowError::Db(err) => {
            log::error!("database error: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

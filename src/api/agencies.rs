// src/api/agencies.rs
//
// Admin oversight of agency accounts: listing, the verified toggle and
// terminal deletion with its cascade.

use actix_web::{delete, get, post, web, HttpResponse, Responder};
use serde_json::json;

use crate::api::auth::AuthContext;
use crate::models::Role;
use crate::{db, AppState};

#[get("/agencies")]
pub async fn list(state: web::Data<AppState>, auth: web::ReqData<AuthContext>) -> impl Responder {
    if auth.role != Role::Admin {
        return HttpResponse::Forbidden().json(json!({"error": "admin only"}));
    }

    match db::list_agencies(&state.pool).await {
        Ok(agencies) => HttpResponse::Ok().json(agencies),
        Err(e) => {
            log::error!("list agencies error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn set_verified(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthContext>,
    agency_id: i32,
    verified: bool,
) -> HttpResponse {
    if auth.role != Role::Admin {
        return HttpResponse::Forbidden().json(json!({"error": "admin only"}));
    }

    match db::set_agency_verified(&state.pool, agency_id, verified).await {
        Ok(true) => {
            if let Ok(Some(account)) = db::get_user(&state.pool, agency_id).await {
                state.notifier.agency_verified(&account, verified);
                HttpResponse::Ok().json(account)
            } else {
                HttpResponse::Ok().json(json!({"verified": verified}))
            }
        }
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "agency not found"})),
        Err(e) => {
            log::error!("set agency verified error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/agencies/{id}/verify")]
pub async fn verify(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthContext>,
    path: web::Path<i32>,
) -> impl Responder {
    set_verified(state, auth, path.into_inner(), true).await
}

#[post("/agencies/{id}/unverify")]
pub async fn unverify(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthContext>,
    path: web::Path<i32>,
) -> impl Responder {
    set_verified(state, auth, path.into_inner(), false).await
}

/// Terminal deletion. Archives the agency's packages and cancels its open
/// bookings in the same transaction as the user row removal.
#[delete("/agencies/{id}")]
pub async fn delete(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthContext>,
    path: web::Path<i32>,
) -> impl Responder {
    if auth.role != Role::Admin {
        return HttpResponse::Forbidden().json(json!({"error": "admin only"}));
    }

    match db::delete_agency_cascade(&state.pool, path.into_inner()).await {
        Ok(Some(outcome)) => {
            state.notifier.agency_deleted(
                &outcome.agency_name,
                outcome.packages_archived,
                outcome.bookings_cancelled,
            );
            HttpResponse::Ok().json(json!({
                "deleted": true,
                "packages_archived": outcome.packages_archived,
                "bookings_cancelled": outcome.bookings_cancelled,
            }))
        }
        Ok(None) => HttpResponse::NotFound().json(json!({"error": "agency not found"})),
        Err(e) => {
            log::error!("delete agency error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

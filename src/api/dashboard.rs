// src/api/dashboard.rs
//
// Read-only statistics. Aggregation happens in SQL; nothing here mutates
// any persisted entity.

use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;

use crate::api::auth::AuthContext;
use crate::models::Role;
use crate::{db, AppState};

#[get("/dashboard/stats")]
pub async fn stats(state: web::Data<AppState>, auth: web::ReqData<AuthContext>) -> impl Responder {
    if auth.role != Role::Admin {
        return HttpResponse::Forbidden().json(json!({"error": "admin only"}));
    }

    let bookings_by_month = match db::monthly_booking_counts(&state.pool).await {
        Ok(v) => v,
        Err(e) => {
            log::error!("dashboard bookings-by-month error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let bookings_by_status = match db::booking_status_counts(&state.pool).await {
        Ok(v) => v,
        Err(e) => {
            log::error!("dashboard bookings-by-status error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let revenue_by_month = match db::monthly_confirmed_revenue(&state.pool).await {
        Ok(v) => v,
        Err(e) => {
            log::error!("dashboard revenue error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let totals = match db::collection_totals(&state.pool).await {
        Ok(t) => t,
        Err(e) => {
            log::error!("dashboard totals error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    HttpResponse::Ok().json(json!({
        "bookings_by_month": bookings_by_month,
        "bookings_by_status": bookings_by_status,
        "revenue_by_month": revenue_by_month,
        "totals": {
            "packages": totals.packages,
            "active_packages": totals.active_packages,
            "agencies": totals.agencies,
            "bookings": totals.bookings,
        },
    }))
}

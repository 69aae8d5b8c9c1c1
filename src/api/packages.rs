// src/api/packages.rs
//
// Package catalog: owner-scoped CRUD plus the publish/unpublish toggle.
// Activation is the only way a package becomes visible to pilgrims.

use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::api::auth::AuthContext;
use crate::models::{ItineraryDay, PackageStatus, Role};
use crate::{db, AppState};

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
}

/// Public catalog: active packages only.
#[utoipa::path(responses((status = 200, description = "active packages")))]
#[get("/packages")]
pub async fn list_catalog(
    state: web::Data<AppState>,
    query: web::Query<CatalogQuery>,
) -> impl Responder {
    let filter = db::PackageFilter {
        status: Some(PackageStatus::Active),
        search: query.q.as_deref(),
        ..Default::default()
    };

    match db::list_packages(&state.pool, &filter).await {
        Ok(packages) => HttpResponse::Ok().json(packages),
        Err(e) => {
            log::error!("list catalog error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Public package detail. Only active packages are exposed here.
#[get("/packages/{id}")]
pub async fn get_catalog_package(
    state: web::Data<AppState>,
    path: web::Path<i32>,
) -> impl Responder {
    match db::get_package(&state.pool, path.into_inner()).await {
        Ok(Some(pkg)) if pkg.status == PackageStatus::Active => HttpResponse::Ok().json(pkg),
        Ok(_) => HttpResponse::NotFound().json(json!({"error": "package not found"})),
        Err(e) => {
            log::error!("get package error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePackageRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub duration_days: i32,
    #[serde(default = "default_group_size")]
    pub group_size: i32,
    #[serde(default)]
    pub inclusions: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
    pub min_payment_percent: Option<i32>,
    pub image_url: Option<String>,
}

fn default_group_size() -> i32 {
    1
}

fn validate_package_input(
    title: &str,
    price: i64,
    min_payment_percent: Option<i32>,
) -> Option<&'static str> {
    if title.trim().is_empty() {
        return Some("title is required");
    }
    if price <= 0 {
        return Some("price must be positive");
    }
    if let Some(pct) = min_payment_percent {
        if !(1..=100).contains(&pct) {
            return Some("min_payment_percent must be between 1 and 100");
        }
    }
    None
}

/// Create a draft package. An agency owns what it creates; an admin creates
/// platform-owned packages (no agency).
#[post("/packages")]
pub async fn create_package(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthContext>,
    payload: web::Json<CreatePackageRequest>,
) -> impl Responder {
    let (agency_id, agency_name) = match auth.role {
        Role::Admin => (None, "Platform".to_string()),
        Role::Agency => {
            let account = match db::get_user(&state.pool, auth.user_id).await {
                Ok(Some(a)) => a,
                Ok(None) => return HttpResponse::Unauthorized().finish(),
                Err(e) => {
                    log::error!("create package user lookup error: {e}");
                    return HttpResponse::InternalServerError().finish();
                }
            };
            (
                Some(auth.user_id),
                account.agency_name.unwrap_or_default(),
            )
        }
        Role::Pilgrim => {
            return HttpResponse::Forbidden()
                .json(json!({"error": "only agencies and admins create packages"}))
        }
    };

    if let Some(msg) =
        validate_package_input(&payload.title, payload.price, payload.min_payment_percent)
    {
        return HttpResponse::BadRequest().json(json!({"error": msg}));
    }

    let pkg = db::NewPackage {
        title: payload.title.trim(),
        description: &payload.description,
        price: payload.price,
        duration_days: payload.duration_days,
        group_size: payload.group_size,
        agency_id,
        agency_name: &agency_name,
        inclusions: &payload.inclusions,
        exclusions: &payload.exclusions,
        itinerary: &payload.itinerary,
        min_payment_percent: payload.min_payment_percent,
        image_url: payload.image_url.as_deref(),
    };

    match db::insert_package(&state.pool, &pkg).await {
        Ok(created) => {
            state.notifier.package_event("created", &created);
            HttpResponse::Ok().json(created)
        }
        Err(e) => {
            log::error!("create package error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub agency_id: Option<i32>,
    pub q: Option<String>,
}

/// Management listing. Admins see everything (with filters), agencies see
/// their own packages.
#[get("/packages")]
pub async fn list_packages(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthContext>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    let status = match query.status.as_deref() {
        Some(s) => match PackageStatus::parse(s) {
            Some(parsed) => Some(parsed),
            None => {
                return HttpResponse::BadRequest().json(json!({"error": "unknown status"}))
            }
        },
        None => None,
    };

    let filter = match auth.role {
        Role::Admin => db::PackageFilter {
            status,
            agency_id: query.agency_id,
            search: query.q.as_deref(),
            ..Default::default()
        },
        Role::Agency => db::PackageFilter {
            status,
            agency_id: Some(auth.user_id),
            search: query.q.as_deref(),
            ..Default::default()
        },
        Role::Pilgrim => {
            return HttpResponse::Forbidden().json(json!({"error": "not allowed"}))
        }
    };

    match db::list_packages(&state.pool, &filter).await {
        Ok(packages) => HttpResponse::Ok().json(packages),
        Err(e) => {
            log::error!("list packages error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn load_owned_package(
    state: &AppState,
    auth: &AuthContext,
    id: i32,
) -> Result<crate::models::Package, HttpResponse> {
    let pkg = match db::get_package(&state.pool, id).await {
        Ok(Some(p)) => p,
        Ok(None) => {
            return Err(HttpResponse::NotFound().json(json!({"error": "package not found"})))
        }
        Err(e) => {
            log::error!("package lookup error: {e}");
            return Err(HttpResponse::InternalServerError().finish());
        }
    };

    let allowed = match auth.role {
        Role::Admin => true,
        Role::Agency => pkg.agency_id == Some(auth.user_id),
        Role::Pilgrim => false,
    };
    if !allowed {
        return Err(HttpResponse::Forbidden().json(json!({"error": "not your package"})));
    }

    Ok(pkg)
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct UpdatePackageRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub duration_days: Option<i32>,
    pub group_size: Option<i32>,
    pub inclusions: Option<Vec<String>>,
    pub exclusions: Option<Vec<String>>,
    pub itinerary: Option<Vec<ItineraryDay>>,
    pub min_payment_percent: Option<i32>,
    pub image_url: Option<String>,
}

#[put("/packages/{id}")]
pub async fn update_package(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthContext>,
    path: web::Path<i32>,
    payload: web::Json<UpdatePackageRequest>,
) -> impl Responder {
    let id = path.into_inner();
    let pkg = match load_owned_package(&state, &auth, id).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    if let Some(price) = payload.price {
        if price <= 0 {
            return HttpResponse::BadRequest().json(json!({"error": "price must be positive"}));
        }
    }
    if let Some(pct) = payload.min_payment_percent {
        if !(1..=100).contains(&pct) {
            return HttpResponse::BadRequest()
                .json(json!({"error": "min_payment_percent must be between 1 and 100"}));
        }
    }
    if let Some(title) = payload.title.as_deref() {
        if title.trim().is_empty() {
            return HttpResponse::BadRequest().json(json!({"error": "title is required"}));
        }
    }

    let patch = db::PackagePatch {
        title: payload.title.as_deref(),
        description: payload.description.as_deref(),
        price: payload.price,
        duration_days: payload.duration_days,
        group_size: payload.group_size,
        inclusions: payload.inclusions.as_deref(),
        exclusions: payload.exclusions.as_deref(),
        itinerary: payload.itinerary.as_deref(),
        min_payment_percent: payload.min_payment_percent,
        image_url: payload.image_url.as_deref(),
    };

    match db::update_package(&state.pool, pkg.id, &patch).await {
        Ok(true) => match db::get_package(&state.pool, id).await {
            Ok(Some(updated)) => {
                state.notifier.package_event("updated", &updated);
                HttpResponse::Ok().json(updated)
            }
            _ => HttpResponse::InternalServerError().finish(),
        },
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "package not found"})),
        Err(e) => {
            log::error!("update package error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

/// Hard delete. Does not cascade: existing bookings keep their denormalized
/// snapshot of title and price.
#[delete("/packages/{id}")]
pub async fn delete_package(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthContext>,
    path: web::Path<i32>,
) -> impl Responder {
    let id = path.into_inner();
    let pkg = match load_owned_package(&state, &auth, id).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    match db::delete_package(&state.pool, pkg.id).await {
        Ok(true) => {
            state.notifier.package_event("deleted", &pkg);
            HttpResponse::Ok().json(json!({"deleted": true}))
        }
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "package not found"})),
        Err(e) => {
            log::error!("delete package error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

/// Publish/unpublish/archive. Activation requires a positive price.
#[patch("/packages/{id}/status")]
pub async fn set_package_status(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthContext>,
    path: web::Path<i32>,
    payload: web::Json<SetStatusRequest>,
) -> impl Responder {
    let id = path.into_inner();
    let Some(status) = PackageStatus::parse(&payload.status) else {
        return HttpResponse::BadRequest().json(json!({"error": "unknown status"}));
    };

    let pkg = match load_owned_package(&state, &auth, id).await {
        Ok(p) => p,
        Err(resp) => return resp,
    };

    if status == PackageStatus::Active && pkg.price <= 0 {
        return HttpResponse::BadRequest()
            .json(json!({"error": "package needs a positive price before activation"}));
    }

    match db::set_package_status(&state.pool, pkg.id, status).await {
        Ok(true) => match db::get_package(&state.pool, id).await {
            Ok(Some(updated)) => {
                state.notifier.package_event("updated", &updated);
                HttpResponse::Ok().json(updated)
            }
            _ => HttpResponse::InternalServerError().finish(),
        },
        Ok(false) => HttpResponse::NotFound().json(json!({"error": "package not found"})),
        Err(e) => {
            log::error!("set package status error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

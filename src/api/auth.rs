// src/api/auth.rs

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{post, web, Error, HttpMessage, HttpResponse, Responder};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::task::{Context, Poll};
use utoipa::ToSchema;

use crate::booking::valid_email;
use crate::models::Role;
use crate::{db, AppState};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i32,
    role: String,
    exp: usize,
}

/// Verified identity injected into request extensions by `JwtMiddleware`.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: i32,
    pub role: Role,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterAgencyRequest {
    pub email: String,
    pub password: String,
    pub agency_name: String,
    pub phone_number: Option<String>,
    pub city_of_operation: Option<String>,
    pub country_of_operation: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i32,
    pub role: String,
}

#[utoipa::path(
    request_body = RegisterRequest,
    responses((status = 200, body = AuthResponse), (status = 400, description = "invalid data"))
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> impl Responder {
    if !valid_email(&payload.email) {
        return HttpResponse::BadRequest().json(serde_json::json!({"error": "invalid email"}));
    }

    let password_hash = match hash(&payload.password, DEFAULT_COST) {
        Ok(h) => h,
        Err(e) => {
            log::error!("bcrypt hash error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let user = db::NewUser {
        email: payload.email.trim(),
        password_hash: &password_hash,
        role: Role::Pilgrim,
        full_name: payload.full_name.as_deref(),
        agency_name: None,
        phone_number: None,
        city_of_operation: None,
        country_of_operation: None,
        address: None,
        description: None,
    };

    let user_id = match db::insert_user(&state.pool, &user).await {
        Ok(id) => id,
        Err(e) => {
            log::error!("register db error: {e}");
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "user already exists or invalid data"
            }));
        }
    };

    issue_token(user_id, Role::Pilgrim)
}

/// Agency sign-up. Accounts always start unverified; only an admin can flip
/// the verified bit.
#[utoipa::path(
    request_body = RegisterAgencyRequest,
    responses((status = 200, body = AuthResponse), (status = 400, description = "invalid data"))
)]
#[post("/auth/register-agency")]
pub async fn register_agency(
    state: web::Data<AppState>,
    payload: web::Json<RegisterAgencyRequest>,
) -> impl Responder {
    if !valid_email(&payload.email) {
        return HttpResponse::BadRequest().json(serde_json::json!({"error": "invalid email"}));
    }
    if payload.agency_name.trim().is_empty() {
        return HttpResponse::BadRequest()
            .json(serde_json::json!({"error": "agency name is required"}));
    }

    let password_hash = match hash(&payload.password, DEFAULT_COST) {
        Ok(h) => h,
        Err(e) => {
            log::error!("bcrypt hash error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let user = db::NewUser {
        email: payload.email.trim(),
        password_hash: &password_hash,
        role: Role::Agency,
        full_name: None,
        agency_name: Some(payload.agency_name.trim()),
        phone_number: payload.phone_number.as_deref(),
        city_of_operation: payload.city_of_operation.as_deref(),
        country_of_operation: payload.country_of_operation.as_deref(),
        address: payload.address.as_deref(),
        description: payload.description.as_deref(),
    };

    let user_id = match db::insert_user(&state.pool, &user).await {
        Ok(id) => id,
        Err(e) => {
            log::error!("register agency db error: {e}");
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "agency already exists or invalid data"
            }));
        }
    };

    if let Ok(Some(account)) = db::get_user(&state.pool, user_id).await {
        state.notifier.agency_registered(&account);
    }

    issue_token(user_id, Role::Agency)
}

#[utoipa::path(
    request_body = LoginRequest,
    responses((status = 200, body = AuthResponse), (status = 401, description = "invalid credentials"))
)]
#[post("/auth/login")]
pub async fn login(state: web::Data<AppState>, payload: web::Json<LoginRequest>) -> impl Responder {
    let row = match db::get_user_credentials(&state.pool, payload.email.trim()).await {
        Ok(r) => r,
        Err(e) => {
            log::error!("login db error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let Some((user_id, password_hash, role)) = row else {
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "invalid credentials"
        }));
    };

    match verify(&payload.password, &password_hash) {
        Ok(true) => {}
        Ok(false) => {
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "invalid credentials"
            }));
        }
        Err(e) => {
            log::error!("bcrypt verify error: {e}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    issue_token(user_id, role)
}

fn issue_token(user_id: i32, role: Role) -> HttpResponse {
    match generate_jwt(user_id, role) {
        Ok(token) => HttpResponse::Ok().json(AuthResponse {
            token,
            user_id,
            role: role.as_str().to_string(),
        }),
        Err(e) => {
            log::error!("jwt encode error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

fn generate_jwt(user_id: i32, role: Role) -> Result<String, jsonwebtoken::errors::Error> {
    let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET required");

    let expiration = Utc::now()
        .checked_add_signed(Duration::days(30))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id,
        role: role.as_str().to_string(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

/// Middleware that takes `Authorization: Bearer <jwt>`, validates it and
/// puts an `AuthContext` into request extensions.
pub struct JwtMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtMiddlewareInner<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtMiddlewareInner { service }))
    }
}

pub struct JwtMiddlewareInner<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareInner<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let secret = match std::env::var("JWT_SECRET") {
            Ok(s) => s,
            Err(_) => {
                return Box::pin(async move {
                    Err(actix_web::error::ErrorInternalServerError(
                        "JWT secret not set",
                    ))
                })
            }
        };

        let auth_header = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .unwrap_or("");

        if let Some(token) = auth_header.strip_prefix("Bearer ") {
            match decode::<Claims>(
                token,
                &DecodingKey::from_secret(secret.as_ref()),
                &Validation::default(),
            ) {
                Ok(token_data) => {
                    let Some(role) = Role::parse(&token_data.claims.role) else {
                        return Box::pin(async move {
                            Err(actix_web::error::ErrorUnauthorized("Invalid token"))
                        });
                    };
                    req.extensions_mut().insert(AuthContext {
                        user_id: token_data.claims.sub,
                        role,
                    });
                    let fut = self.service.call(req);
                    return Box::pin(async move { fut.await });
                }
                Err(_) => {
                    return Box::pin(async move {
                        Err(actix_web::error::ErrorUnauthorized("Invalid token"))
                    })
                }
            }
        }

        Box::pin(async move {
            Err(actix_web::error::ErrorUnauthorized(
                "Missing or invalid Authorization header",
            ))
        })
    }
}

// src/main.rs
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use dotenvy::dotenv;
use sqlx::PgPool;
use std::env;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use manasik::gateway::PaymentGateway;
use manasik::mailer::Mailer;
use manasik::notify::Notifier;
use manasik::{api, docs, AppState};

async fn index() -> impl Responder {
    HttpResponse::Ok().body("Service ready!")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // Fail fast on missing secrets instead of failing per-request.
    env::var("JWT_SECRET").expect("JWT_SECRET required");
    let gateway_secret = env::var("PAYSTACK_SECRET_KEY").expect("PAYSTACK_SECRET_KEY required");
    let gateway_base =
        env::var("PAYSTACK_BASE_URL").unwrap_or_else(|_| "https://api.paystack.co".to_string());
    let currency = env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "NGN".to_string());

    let gateway = PaymentGateway::new(gateway_base, gateway_secret, currency);
    let notifier = Notifier::new(
        env::var("NOTIFY_WEBHOOK_AGENCIES").ok(),
        env::var("NOTIFY_WEBHOOK_PACKAGES").ok(),
        env::var("NOTIFY_WEBHOOK_PAYMENTS").ok(),
    );
    let mailer = Mailer::new(env::var("EMAIL_ENDPOINT_URL").ok());

    let state = web::Data::new(AppState {
        pool,
        gateway,
        notifier,
        mailer,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/", web::get().to(index))
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
            )
            // public routes
            .service(api::auth::register)
            .service(api::auth::register_agency)
            .service(api::auth::login)
            .service(api::packages::list_catalog)
            .service(api::packages::get_catalog_package)
            // authenticated routes
            .service(
                web::scope("/api")
                    .wrap(api::auth::JwtMiddleware)
                    .service(api::packages::create_package)
                    .service(api::packages::list_packages)
                    .service(api::packages::update_package)
                    .service(api::packages::delete_package)
                    .service(api::packages::set_package_status)
                    .service(api::bookings::initiate)
                    .service(api::bookings::complete)
                    .service(api::bookings::cancel_payment)
                    .service(api::bookings::create_custom)
                    .service(api::bookings::list)
                    .service(api::bookings::update_status)
                    .service(api::bookings::delete)
                    .service(api::payments_admin::list)
                    .service(api::payments_admin::confirm)
                    .service(api::agencies::list)
                    .service(api::agencies::verify)
                    .service(api::agencies::unverify)
                    .service(api::agencies::delete)
                    .service(api::dashboard::stats),
            )
    })
    .bind(("0.0.0.0", 8080))?
    .run()
    .await
}

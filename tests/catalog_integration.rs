mod support;

use actix_web::{test, web, App};
use serde_json::{json, Value};

use manasik::gateway::PaymentGateway;
use manasik::mailer::Mailer;
use manasik::notify::Notifier;
use manasik::{api, AppState};

fn build_state(pool: sqlx::PgPool) -> web::Data<AppState> {
    web::Data::new(AppState {
        pool,
        gateway: PaymentGateway::new(
            "http://localhost:1".to_string(),
            "test-secret".to_string(),
            "NGN".to_string(),
        ),
        notifier: Notifier::default(),
        mailer: Mailer::default(),
    })
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .service(api::auth::register)
                .service(api::auth::register_agency)
                .service(api::auth::login)
                .service(api::packages::list_catalog)
                .service(api::packages::get_catalog_package)
                .service(
                    web::scope("/api")
                        .wrap(api::auth::JwtMiddleware)
                        .service(api::packages::create_package)
                        .service(api::packages::list_packages)
                        .service(api::packages::set_package_status),
                ),
        )
        .await
    };
}

macro_rules! register_agency_token {
    ($app:expr, $email:expr) => {{
        let req = test::TestRequest::post()
            .uri("/auth/register-agency")
            .set_json(json!({
                "email": $email,
                "password": "secret123",
                "agency_name": "Test Agency",
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json($app, req).await;
        body["token"].as_str().expect("token issued").to_string()
    }};
}

#[actix_web::test]
async fn catalog_lists_only_activated_packages() {
    let Some(db) = support::init_test_db().await else {
        return;
    };
    std::env::set_var("JWT_SECRET", "test-jwt-secret");

    let state = build_state(db.pool.clone());
    let app = app!(state);

    let token = register_agency_token!(&app, "catalog@agency.example");

    // create a draft package
    let req = test::TestRequest::post()
        .uri("/api/packages")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({
            "title": "Ramadan Umrah",
            "description": "Ten nights in Makkah and Madinah",
            "price": 350000,
            "duration_days": 10,
            "min_payment_percent": 30,
        }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let package_id = created["id"].as_i64().expect("package id");
    assert_eq!(created["status"], "draft");

    // drafts are invisible to pilgrims
    let req = test::TestRequest::get().uri("/packages").to_request();
    let catalog: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(catalog.as_array().unwrap().len(), 0);

    let req = test::TestRequest::get()
        .uri(&format!("/packages/{package_id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    // publish
    let req = test::TestRequest::patch()
        .uri(&format!("/api/packages/{package_id}/status"))
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({"status": "active"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    // now discoverable, with a positive price
    let req = test::TestRequest::get().uri("/packages").to_request();
    let catalog: Value = test::call_and_read_body_json(&app, req).await;
    let items = catalog.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Ramadan Umrah");
    assert!(items[0]["price"].as_i64().unwrap() > 0);

    // text search is query-side
    let req = test::TestRequest::get().uri("/packages?q=ramadan").to_request();
    let catalog: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(catalog.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get().uri("/packages?q=nosuch").to_request();
    let catalog: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(catalog.as_array().unwrap().len(), 0);
}

#[actix_web::test]
async fn pilgrims_cannot_create_packages() {
    let Some(db) = support::init_test_db().await else {
        return;
    };
    std::env::set_var("JWT_SECRET", "test-jwt-secret");

    let state = build_state(db.pool.clone());
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "email": "walker@example.com",
            "password": "secret123",
            "full_name": "Walker",
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["token"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/packages")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({
            "title": "Sneaky",
            "price": 1000,
            "duration_days": 3,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn zero_price_is_rejected_at_creation() {
    let Some(db) = support::init_test_db().await else {
        return;
    };
    std::env::set_var("JWT_SECRET", "test-jwt-secret");

    let state = build_state(db.pool.clone());
    let app = app!(state);

    let token = register_agency_token!(&app, "zero@agency.example");

    let req = test::TestRequest::post()
        .uri("/api/packages")
        .insert_header(("Authorization", format!("Bearer {token}")))
        .set_json(json!({
            "title": "Free Trip",
            "price": 0,
            "duration_days": 5,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

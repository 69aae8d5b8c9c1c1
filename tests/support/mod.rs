#![allow(dead_code)]

use sqlx::PgPool;
use std::env;
use std::sync::OnceLock;
use tokio::sync::{Mutex, MutexGuard};

use manasik::db::{self, NewPackage, NewUser};
use manasik::models::{PackageStatus, Role, UserAccount};

fn split_db_url(url: &str) -> Result<(String, String), String> {
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base.to_string(), Some(query)),
        None => (url.to_string(), None),
    };

    let db_start = base
        .rfind('/')
        .ok_or_else(|| "invalid database url".to_string())?;
    if db_start + 1 >= base.len() {
        return Err("database name is empty".to_string());
    }

    let db_name = base[db_start + 1..].to_string();
    let mut admin_url = format!("{}postgres", &base[..db_start + 1]);
    if let Some(query) = query {
        admin_url = format!("{admin_url}?{query}");
    }

    Ok((admin_url, db_name))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

static TEST_DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

pub struct TestDb {
    pub pool: PgPool,
    _guard: MutexGuard<'static, ()>,
}

/// Provisions a scratch database from TEST_DATABASE_URL. Returns None (so
/// the test can skip) when the variable is not set.
pub async fn init_test_db() -> Option<TestDb> {
    dotenvy::dotenv().ok();
    let Ok(test_url) = env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping database test");
        return None;
    };
    let (admin_url, db_name) = split_db_url(&test_url).expect("invalid TEST_DATABASE_URL format");

    let lock = TEST_DB_LOCK.get_or_init(|| Mutex::new(()));
    let guard = lock.lock().await;

    let admin_pool = PgPool::connect(&admin_url).await.expect("connect admin db");

    let _ = sqlx::query("SELECT pg_advisory_lock(424242)")
        .execute(&admin_pool)
        .await;

    let quoted_name = quote_identifier(&db_name);
    let drop_sql = format!("DROP DATABASE IF EXISTS {quoted_name} WITH (FORCE)");
    let create_sql = format!("CREATE DATABASE {quoted_name}");

    let _ = sqlx::query(&drop_sql).execute(&admin_pool).await;
    let create_result = sqlx::query(&create_sql).execute(&admin_pool).await;
    if let Err(e) = create_result {
        eprintln!("create test db error: {e}");
        let _ = sqlx::query(&drop_sql).execute(&admin_pool).await;
        sqlx::query(&create_sql)
            .execute(&admin_pool)
            .await
            .expect("create test db retry");
    }

    let _ = sqlx::query("SELECT pg_advisory_unlock(424242)")
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;

    let pool = PgPool::connect(&test_url).await.expect("connect test db");
    sqlx::migrate!().run(&pool).await.expect("migrations");
    Some(TestDb {
        pool,
        _guard: guard,
    })
}

pub async fn create_pilgrim(pool: &PgPool, email: &str, name: &str) -> UserAccount {
    let id = db::insert_user(
        pool,
        &NewUser {
            email,
            password_hash: "x",
            role: Role::Pilgrim,
            full_name: Some(name),
            agency_name: None,
            phone_number: None,
            city_of_operation: None,
            country_of_operation: None,
            address: None,
            description: None,
        },
    )
    .await
    .expect("insert pilgrim");

    db::get_user(pool, id).await.unwrap().unwrap()
}

pub async fn create_agency(pool: &PgPool, email: &str, name: &str) -> UserAccount {
    let id = db::insert_user(
        pool,
        &NewUser {
            email,
            password_hash: "x",
            role: Role::Agency,
            full_name: None,
            agency_name: Some(name),
            phone_number: Some("+111222333"),
            city_of_operation: Some("Jeddah"),
            country_of_operation: Some("Saudi Arabia"),
            address: None,
            description: None,
        },
    )
    .await
    .expect("insert agency");

    db::get_user(pool, id).await.unwrap().unwrap()
}

pub async fn create_active_package(
    pool: &PgPool,
    agency: Option<&UserAccount>,
    title: &str,
    price: i64,
    min_payment_percent: Option<i32>,
) -> manasik::models::Package {
    let pkg = db::insert_package(
        pool,
        &NewPackage {
            title,
            description: "Guided pilgrimage package",
            price,
            duration_days: 14,
            group_size: 20,
            agency_id: agency.map(|a| a.id),
            agency_name: agency
                .and_then(|a| a.agency_name.as_deref())
                .unwrap_or("Platform"),
            inclusions: &["Visa".to_string(), "Hotel".to_string()],
            exclusions: &["Flights".to_string()],
            itinerary: &[],
            min_payment_percent,
            image_url: None,
        },
    )
    .await
    .expect("insert package");

    assert!(
        db::set_package_status(pool, pkg.id, PackageStatus::Active)
            .await
            .expect("activate package")
    );

    db::get_package(pool, pkg.id).await.unwrap().unwrap()
}

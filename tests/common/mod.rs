#![allow(dead_code)]

use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use staffdesk::auth::jwt::generate_access_token;
use staffdesk::config::Config;
use staffdesk::db::MIGRATOR;
use std::net::SocketAddr;

/// Builds the service under test over a fresh in-memory database.
#[macro_export]
macro_rules! init_app {
    ($pool:expr, $config:expr) => {{
        let cfg = $config.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($pool.clone()))
                .app_data(actix_web::web::Data::new($config.clone()))
                .configure(move |c| staffdesk::routes::configure(c, cfg)),
        )
        .await
    }};
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        jwt_secret: "test-secret".into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 900,
        refresh_token_ttl: 604800,
        rate_login_per_min: 10_000,
        rate_register_per_min: 10_000,
        rate_refresh_per_min: 10_000,
        rate_protected_per_min: 10_000,
        api_prefix: "/api".into(),
    }
}

/// One connection: every handler in a test sees the same in-memory db.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    MIGRATOR.run(&pool).await.expect("migrations");
    pool
}

/// The governor key extractor needs a peer address on every request.
pub fn peer() -> SocketAddr {
    "127.0.0.1:8080".parse().unwrap()
}

pub fn admin_token(config: &Config) -> String {
    generate_access_token(
        1,
        "admin@staffdesk.test".into(),
        1,
        None,
        &config.jwt_secret,
        config.access_token_ttl,
    )
}

pub fn employee_token(config: &Config, employee_id: &str) -> String {
    generate_access_token(
        2,
        "employee@staffdesk.test".into(),
        2,
        Some(employee_id.into()),
        &config.jwt_secret,
        config.access_token_ttl,
    )
}

pub fn authed(req: actix_web::test::TestRequest, token: &str) -> actix_web::test::TestRequest {
    req.peer_addr(peer())
        .insert_header(("Authorization", format!("Bearer {}", token)))
}

/// A complete, valid create-employee payload. Emails must be unique per
/// test: the duplicate-email fast path is process-global.
pub fn employee_payload(name: &str, email: &str, department: &str) -> Value {
    json!({
        "name": name,
        "email": email,
        "department": department,
        "salary": 85000.0,
        "phone_number": "+8801712345678",
        "sex": "Female",
        "qualifications": "BSc CSE",
        "role": "Employee",
        "date_of_birth": "1994-03-12",
        "joining_date": "2021-06-01",
        "experience": "5 years"
    })
}

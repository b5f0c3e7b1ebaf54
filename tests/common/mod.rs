#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::test;
use dotenv::dotenv;
use serde_json::{json, Value};
use sqlx::PgPool;
use todo_api::{db, Bootstrap, Settings};
use uuid::Uuid;

/// Connects to `DATABASE_URL` and makes sure the schema exists.
pub async fn bootstrap() -> (Bootstrap, PgPool) {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    db::create_db_and_tables(&pool)
        .await
        .expect("Failed to create schema");

    let settings = Settings::new(&database_url, "integration-test-secret");
    let bootstrap = Bootstrap::new(settings, pool.clone())
        .with_default_routers()
        .expect("default routers conflict");
    (bootstrap, pool)
}

/// Builds the application exactly as each server worker does.
macro_rules! init_app {
    ($bootstrap:expr) => {{
        let bootstrap: todo_api::Bootstrap = $bootstrap;
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(bootstrap.settings().allowed_origins.cors())
                .wrap(actix_web::middleware::Logger::default())
                .configure(|cfg| bootstrap.configure(cfg)),
        )
        .await
    }};
}

pub fn unique_email(tag: &str) -> String {
    format!("{}-{}@example.com", tag, Uuid::new_v4().simple())
}

pub fn signup_body(name: &str, email: &str) -> Value {
    json!({ "name": name, "email": email, "password": "Password123!" })
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Works for any body type, including the logged and auth-wrapped bodies
/// the full application produces.
pub async fn body_json<B: MessageBody>(resp: ServiceResponse<B>) -> Value {
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        panic!(
            "status {} with non-JSON body: {}",
            status,
            String::from_utf8_lossy(&bytes)
        )
    })
}

pub async fn cleanup_user(pool: &PgPool, email: &str) {
    // Tasks and chat history cascade with the user row.
    let _ = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await;
}

use actix_web::http::{header, StatusCode};
use actix_web::middleware::Logger;
use actix_web::{test, web, App, HttpResponse};
use futures::future::BoxFuture;
use pretty_assertions::assert_eq;
use serde_json::json;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use todo_api::routes::{self, RouterMount};
use todo_api::startup::SchemaInitializer;
use todo_api::{launch, AllowedOrigins, Bootstrap, BootstrapError, Settings};

const FRONTEND: &str = "http://localhost:3000";

/// Builds the same `App` the server builds for each worker.
macro_rules! init_app {
    ($bootstrap:expr) => {{
        let bootstrap: Bootstrap = $bootstrap;
        test::init_service(
            App::new()
                .wrap(bootstrap.settings().allowed_origins.cors())
                .wrap(Logger::default())
                .configure(|cfg| bootstrap.configure(cfg)),
        )
        .await
    }};
}

// Nothing listens on port 1, so any accidental query fails fast instead of hanging.
fn unreachable_pool() -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_millis(200))
        .connect_lazy("postgres://postgres@127.0.0.1:1/todo")
        .unwrap()
}

fn settings() -> Settings {
    let mut settings = Settings::new("postgres://postgres@127.0.0.1:1/todo", "bootstrap-secret");
    settings.allowed_origins = AllowedOrigins::parse(&format!("{},https://todo.example.com", FRONTEND)).unwrap();
    settings
}

fn default_bootstrap() -> Bootstrap {
    Bootstrap::new(settings(), unreachable_pool())
        .with_default_routers()
        .unwrap()
}

#[actix_rt::test]
async fn health_returns_fixed_payload_without_database() {
    let app = init_app!(default_bootstrap());

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"status": "healthy", "service": "todo-api"}));
}

#[actix_rt::test]
async fn documentation_is_public() {
    let app = init_app!(default_bootstrap());

    for path in ["/docs", "/redoc"] {
        let req = test::TestRequest::get().uri(path).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "GET {}", path);
        let body = test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains("<html"), "GET {} is not HTML", path);
    }

    let req = test::TestRequest::get().uri("/openapi.json").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let doc: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(doc["info"]["title"], "Full-Stack Todo API");
    assert_eq!(doc["info"]["version"], "1.0.0");
    assert_eq!(
        doc["info"]["description"],
        "RESTful API for multi-user todo task management with JWT authentication"
    );
}

#[actix_rt::test]
async fn allowed_origin_gets_credentialed_cors() {
    let app = init_app!(default_bootstrap());

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header((header::ORIGIN, FRONTEND))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        FRONTEND
    );
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}

#[actix_rt::test]
async fn allowed_origin_preflight_succeeds_for_any_method_and_header() {
    let app = init_app!(default_bootstrap());

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/api/tasks")
        .insert_header((header::ORIGIN, "https://todo.example.com"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "DELETE"))
        .insert_header((
            header::ACCESS_CONTROL_REQUEST_HEADERS,
            "authorization, content-type, x-custom-header",
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success(), "preflight status {}", resp.status());
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://todo.example.com"
    );
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .unwrap(),
        "true"
    );
}

#[actix_rt::test]
async fn unlisted_origin_is_rejected_by_cors_layer() {
    let app = init_app!(default_bootstrap());

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header((header::ORIGIN, "http://evil.example"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());
    assert!(resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());

    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/api/tasks")
        .insert_header((header::ORIGIN, "http://evil.example"))
        .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "GET"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());
    assert!(resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[actix_rt::test]
async fn auth_rejections_still_carry_cors_headers() {
    let app = init_app!(default_bootstrap());

    let req = test::TestRequest::get()
        .uri("/api/tasks")
        .insert_header((header::ORIGIN, FRONTEND))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        FRONTEND
    );
}

#[actix_rt::test]
async fn malformed_json_is_a_json_bad_request() {
    let app = init_app!(default_bootstrap());

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["detail"].is_string());
}

fn alpha(cfg: &mut web::ServiceConfig, prefix: &str) {
    cfg.service(
        web::scope(prefix).route("/whoami", web::get().to(|| async { HttpResponse::Ok().body("alpha") })),
    );
}

fn beta(cfg: &mut web::ServiceConfig, prefix: &str) {
    cfg.service(
        web::scope(prefix).route("/whoami", web::get().to(|| async { HttpResponse::Ok().body("beta") })),
    );
}

#[actix_rt::test]
async fn mount_order_does_not_change_dispatch() {
    let forward = Bootstrap::new(settings(), unreachable_pool())
        .mount(RouterMount::new("alpha", "/api/alpha", alpha))
        .unwrap()
        .mount(RouterMount::new("beta", "/api/beta", beta))
        .unwrap();
    let reverse = Bootstrap::new(settings(), unreachable_pool())
        .mount(RouterMount::new("beta", "/api/beta", beta))
        .unwrap()
        .mount(RouterMount::new("alpha", "/api/alpha", alpha))
        .unwrap();

    for bootstrap in [forward, reverse] {
        let app = init_app!(bootstrap);
        for (path, expected) in [("/api/alpha/whoami", "alpha"), ("/api/beta/whoami", "beta")] {
            let req = test::TestRequest::get().uri(path).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(test::read_body(resp).await, expected);
        }
    }
}

#[actix_rt::test]
async fn standard_routers_work_in_any_order() {
    let mut mounts = routes::default_mounts();
    mounts.reverse();
    let bootstrap = mounts
        .into_iter()
        .try_fold(Bootstrap::new(settings(), unreachable_pool()), |b, m| b.mount(m))
        .unwrap();
    let app = init_app!(bootstrap);

    // Validation fails inside the auth router before any query runs.
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .set_json(json!({"name": "A", "email": "nope", "password": "password123"}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    for path in ["/api/tasks", "/api/chat/conversations", "/api/auth/me"] {
        let req = test::TestRequest::get().uri(path).to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED,
            "GET {}",
            path
        );
    }
}

#[actix_rt::test]
async fn overlapping_mounts_fail_at_bootstrap() {
    let result = Bootstrap::new(settings(), unreachable_pool())
        .with_default_routers()
        .unwrap()
        .mount(RouterMount::new("chat-v2", "/api/chat/", beta));
    assert!(matches!(
        result,
        Err(BootstrapError::RouterMountConflict { .. })
    ));
}

#[derive(Default)]
struct FakeSchema {
    calls: AtomicUsize,
    fail: bool,
}

impl SchemaInitializer for FakeSchema {
    fn initialize(&self) -> BoxFuture<'_, Result<(), sqlx::Error>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = self.fail;
        Box::pin(async move {
            if fail {
                Err(sqlx::Error::Protocol("simulated schema failure".into()))
            } else {
                Ok(())
            }
        })
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn server_settings(debug: bool, port: u16) -> Settings {
    let mut settings = settings();
    settings.debug = debug;
    settings.host = "127.0.0.1".to_string();
    settings.port = port;
    settings.workers = Some(1);
    settings
}

#[actix_rt::test]
async fn failed_schema_initialization_never_opens_the_port() {
    let port = free_port();
    let schema = FakeSchema {
        fail: true,
        ..Default::default()
    };

    let result = launch(server_settings(true, port), &schema, unreachable_pool()).await;
    assert!(matches!(
        result,
        Err(BootstrapError::SchemaInitializationFailure(_))
    ));
    assert_eq!(schema.calls.load(Ordering::SeqCst), 1);
    assert!(tokio::net::TcpStream::connect(("127.0.0.1", port))
        .await
        .is_err());
}

#[actix_rt::test]
async fn debug_mode_initializes_schema_once_before_serving() {
    let port = free_port();
    let schema = FakeSchema::default();

    let server = launch(server_settings(true, port), &schema, unreachable_pool())
        .await
        .unwrap();
    assert_eq!(schema.calls.load(Ordering::SeqCst), 1);

    let handle = server.handle();
    actix_rt::spawn(server);

    let body: serde_json::Value = reqwest::get(format!("http://127.0.0.1:{}/health", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({"status": "healthy", "service": "todo-api"}));
    assert_eq!(schema.calls.load(Ordering::SeqCst), 1);

    handle.stop(true).await;
}

#[actix_rt::test]
async fn release_mode_never_initializes_schema() {
    let port = free_port();
    let schema = FakeSchema::default();

    let server = launch(server_settings(false, port), &schema, unreachable_pool())
        .await
        .unwrap();
    assert_eq!(schema.calls.load(Ordering::SeqCst), 0);

    let handle = server.handle();
    actix_rt::spawn(server);
    let status = reqwest::get(format!("http://127.0.0.1:{}/health", port))
        .await
        .unwrap()
        .status();
    assert!(status.is_success());

    handle.stop(true).await;
}

use actix_web::{web, HttpResponse};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;
use utoipa_redoc::{Redoc, Servable};

use crate::app;
use crate::auth::{AuthResponse, LoginRequest, SignupRequest};
use crate::models::{
    ChatMessage, ChatRequest, ChatResponse, Conversation, MessageRole, Task, TaskInput,
    TaskPriority, TaskStatus, ToolCall, User,
};
use crate::routes::{auth, chat, health, health::HealthResponse, tasks};

pub const DOCS_PATH: &str = "/docs";
pub const REDOC_PATH: &str = "/redoc";
pub const OPENAPI_PATH: &str = "/openapi.json";

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::signup,
        auth::login,
        auth::me,
        tasks::get_tasks,
        tasks::create_task,
        tasks::get_task,
        tasks::update_task,
        tasks::toggle_complete,
        tasks::delete_task,
        chat::send_message,
        chat::list_conversations,
        chat::list_messages,
    ),
    components(schemas(
        HealthResponse,
        SignupRequest,
        LoginRequest,
        AuthResponse,
        User,
        Task,
        TaskInput,
        TaskPriority,
        TaskStatus,
        ChatRequest,
        ChatResponse,
        ToolCall,
        Conversation,
        ChatMessage,
        MessageRole,
    )),
    modifiers(&InfoAddon, &SecurityAddon),
    tags(
        (name = "health", description = "Liveness check"),
        (name = "auth", description = "Signup, login and profile"),
        (name = "tasks", description = "Task management"),
        (name = "chat", description = "Task assistant")
    )
)]
pub struct ApiDoc;

/// Takes title, version and description from the bootstrap constants.
pub struct InfoAddon;

impl Modify for InfoAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = app::TITLE.to_string();
        openapi.info.version = app::VERSION.to_string();
        openapi.info.description = Some(app::DESCRIPTION.to_string());
    }
}

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

/// Registers `/openapi.json`, the interactive viewer at `/docs` and the
/// ReDoc view at `/redoc`. None of them require authentication.
pub fn register(cfg: &mut web::ServiceConfig) {
    cfg.route(OPENAPI_PATH, web::get().to(openapi_json))
        .service(RapiDoc::new(OPENAPI_PATH).path(DOCS_PATH))
        .service(Redoc::with_url(REDOC_PATH, ApiDoc::openapi()));
}

use crate::{
    auth::{AuthMiddleware, AuthenticatedUser},
    chat::{self, reply, Intent},
    db,
    error::AppError,
    models::{ChatRequest, ChatResponse, MessageRole, Task, TaskInput, TaskStatus, ToolCall},
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

/// Mounts the assistant endpoints under `prefix`, all behind `AuthMiddleware`.
pub fn register(cfg: &mut web::ServiceConfig, prefix: &str) {
    cfg.service(
        web::scope(prefix)
            .wrap(AuthMiddleware)
            .service(send_message)
            .service(list_conversations)
            .service(list_messages),
    );
}

/// Sends a message to the task assistant.
///
/// The message and the reply are stored in the conversation; omitting
/// `conversation_id` starts a new one.
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "chat",
    request_body = ChatRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Unknown conversation"),
        (status = 422, description = "Invalid input")
    )
)]
#[post("")]
pub async fn send_message(
    pool: web::Data<PgPool>,
    payload: web::Json<ChatRequest>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    let ChatRequest {
        conversation_id,
        message,
    } = payload.into_inner();

    // One transaction per turn: a failure anywhere leaves no partial history.
    let mut tx = pool.begin().await?;

    let conversation = match conversation_id {
        Some(id) => db::chat::find_conversation(&mut *tx, id, user.0)
            .await?
            .ok_or_else(|| AppError::NotFound("Conversation not found".into()))?,
        None => db::chat::create_conversation(&mut *tx, user.0).await?,
    };

    db::chat::append_message(&mut *tx, conversation.id, user.0, MessageRole::User, &message)
        .await?;

    let intent = chat::parse(&message);
    log::debug!("chat intent for user {}: {:?}", user.0, intent);
    let (response, tool_calls) = respond(&mut *tx, user.0, intent).await?;

    db::chat::append_message(
        &mut *tx,
        conversation.id,
        user.0,
        MessageRole::Assistant,
        &response,
    )
    .await?;
    db::chat::touch_conversation(&mut *tx, conversation.id).await?;
    tx.commit().await?;

    Ok(HttpResponse::Ok().json(ChatResponse {
        conversation_id: conversation.id,
        response,
        tool_calls,
    }))
}

/// Lists the caller's conversations, most recently active first.
#[utoipa::path(
    get,
    path = "/api/chat/conversations",
    tag = "chat",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Conversations", body = [Conversation]),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[get("/conversations")]
pub async fn list_conversations(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let conversations = db::chat::list_conversations(pool.get_ref(), user.0).await?;
    Ok(HttpResponse::Ok().json(conversations))
}

/// Full transcript of one conversation, oldest message first.
#[utoipa::path(
    get,
    path = "/api/chat/conversations/{id}/messages",
    tag = "chat",
    params(("id" = Uuid, Path, description = "Conversation id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Messages", body = [ChatMessage]),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Unknown conversation")
    )
)]
#[get("/conversations/{id}/messages")]
pub async fn list_messages(
    pool: web::Data<PgPool>,
    conversation_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let id = conversation_id.into_inner();
    db::chat::find_conversation(pool.get_ref(), id, user.0)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".into()))?;

    let messages = db::chat::list_messages(pool.get_ref(), id, user.0).await?;
    Ok(HttpResponse::Ok().json(messages))
}

/// Carries out `intent` against the user's tasks and phrases the answer.
async fn respond(
    conn: &mut PgConnection,
    user_id: i32,
    intent: Intent,
) -> Result<(String, Vec<ToolCall>), AppError> {
    let outcome = match intent {
        Intent::AddTask { title } => {
            let task = Task::new(
                TaskInput {
                    title: title.clone(),
                    description: None,
                    priority: None,
                    status: None,
                    due_date: None,
                },
                user_id,
            );
            let created = db::tasks::insert(&mut *conn, &task).await?;
            (
                format!("Added \"{}\" to your tasks.", created.title),
                vec![ToolCall::new(
                    "add_task",
                    json!({ "title": title, "task_id": created.id }),
                )],
            )
        }
        Intent::ListTasks(filter) => {
            let tasks = db::tasks::list_in_creation_order(&mut *conn, user_id).await?;
            (
                reply::format_task_list(&tasks, filter),
                vec![ToolCall::new(
                    "list_tasks",
                    json!({ "status": reply::filter_name(filter) }),
                )],
            )
        }
        Intent::CompleteTask(target) => {
            let tasks = db::tasks::list_in_creation_order(&mut *conn, user_id).await?;
            match reply::resolve(&target, &tasks) {
                Err(e) => (e.message(), Vec::new()),
                Ok(task) if task.status.is_done() => {
                    (format!("\"{}\" is already completed.", task.title), Vec::new())
                }
                Ok(task) => {
                    db::tasks::set_status(&mut *conn, task.id, user_id, TaskStatus::Done).await?;
                    (
                        format!("Marked \"{}\" as completed.", task.title),
                        vec![ToolCall::new("complete_task", json!({ "task_id": task.id }))],
                    )
                }
            }
        }
        Intent::DeleteTask(target) => {
            let tasks = db::tasks::list_in_creation_order(&mut *conn, user_id).await?;
            match reply::resolve(&target, &tasks) {
                Err(e) => (e.message(), Vec::new()),
                Ok(task) => {
                    db::tasks::delete_owned(&mut *conn, task.id, user_id).await?;
                    (
                        format!("Deleted \"{}\".", task.title),
                        vec![ToolCall::new("delete_task", json!({ "task_id": task.id }))],
                    )
                }
            }
        }
        Intent::RenameTask { target, title } => {
            let tasks = db::tasks::list_in_creation_order(&mut *conn, user_id).await?;
            match reply::resolve(&target, &tasks) {
                Err(e) => (e.message(), Vec::new()),
                Ok(task) => {
                    db::tasks::rename(&mut *conn, task.id, user_id, &title).await?;
                    (
                        format!("Renamed \"{}\" to \"{}\".", task.title, title),
                        vec![ToolCall::new(
                            "update_task",
                            json!({ "task_id": task.id, "title": title }),
                        )],
                    )
                }
            }
        }
        Intent::Greeting => (reply::GREETING_TEXT.to_string(), Vec::new()),
        Intent::Help => (reply::HELP_TEXT.to_string(), Vec::new()),
        Intent::Unknown => (reply::FALLBACK_TEXT.to_string(), Vec::new()),
    };
    Ok(outcome)
}

use crate::{
    auth::{AuthMiddleware, AuthenticatedUser},
    db,
    error::AppError,
    models::{Task, TaskInput, TaskQuery},
};
use actix_web::{delete, get, patch, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Mounts the task CRUD endpoints under `prefix`, all behind `AuthMiddleware`.
pub fn register(cfg: &mut web::ServiceConfig, prefix: &str) {
    cfg.service(
        web::scope(prefix)
            .wrap(AuthMiddleware)
            .service(get_tasks)
            .service(create_task)
            .service(get_task)
            .service(update_task)
            .service(toggle_complete)
            .service(delete_task),
    );
}

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Retrieves the authenticated user's tasks.
///
/// Newest first. `status` and `priority` filter exactly; `search` matches
/// title or description case-insensitively.
#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "tasks",
    params(TaskQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Tasks owned by the caller", body = [Task]),
        (status = 401, description = "Missing or invalid token")
    )
)]
#[get("")]
pub async fn get_tasks(
    pool: web::Data<PgPool>,
    query: web::Query<TaskQuery>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let tasks = db::tasks::list_for_user(pool.get_ref(), user.0, &query).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a new task owned by the authenticated user.
#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "tasks",
    request_body = TaskInput,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 401, description = "Missing or invalid token"),
        (status = 422, description = "Invalid input")
    )
)]
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    payload: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    if payload.title.trim().is_empty() {
        return Err(AppError::ValidationError("title: must not be blank".into()));
    }

    let task = Task::new(payload.into_inner(), user.0);
    let created = db::tasks::insert(pool.get_ref(), &task).await?;
    log::debug!("user {} created task {}", user.0, created.id);
    Ok(HttpResponse::Created().json(created))
}

/// Retrieves one task. Tasks of other users are reported as not found.
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = Uuid, Path, description = "Task id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The task", body = Task),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such task for this user")
    )
)]
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = db::tasks::find_owned(pool.get_ref(), task_id.into_inner(), user.0)
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Replaces the editable fields of a task.
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = TaskInput,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated task", body = Task),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such task for this user"),
        (status = 422, description = "Invalid input")
    )
)]
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    payload: web::Json<TaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    if payload.title.trim().is_empty() {
        return Err(AppError::ValidationError("title: must not be blank".into()));
    }

    let task = db::tasks::replace(pool.get_ref(), task_id.into_inner(), user.0, &payload)
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Toggles a task between `done` and `todo`.
#[utoipa::path(
    patch,
    path = "/api/tasks/{id}/complete",
    tag = "tasks",
    params(("id" = Uuid, Path, description = "Task id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Task with its new status", body = Task),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such task for this user")
    )
)]
#[patch("/{id}/complete")]
pub async fn toggle_complete(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = db::tasks::toggle_done(pool.get_ref(), task_id.into_inner(), user.0)
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes a task.
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "tasks",
    params(("id" = Uuid, Path, description = "Task id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "No such task for this user")
    )
)]
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    if !db::tasks::delete_owned(pool.get_ref(), task_id.into_inner(), user.0).await? {
        return Err(not_found());
    }
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_token, TokenConfig};
    use actix_web::{http::header, http::StatusCode, test, App};
    use serde_json::json;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> web::Data<PgPool> {
        web::Data::new(
            PgPoolOptions::new()
                .connect_lazy("postgres://postgres@127.0.0.1:1/unused")
                .unwrap(),
        )
    }

    #[actix_rt::test]
    async fn test_tasks_require_token() {
        let app = test::init_service(
            App::new()
                .app_data(lazy_pool())
                .app_data(web::Data::new(TokenConfig::new("secret", 1)))
                .configure(|cfg| register(cfg, "/api/tasks")),
        )
        .await;

        for req in [
            test::TestRequest::get().uri("/api/tasks").to_request(),
            test::TestRequest::post()
                .uri("/api/tasks")
                .set_json(json!({"title": "x"}))
                .to_request(),
            test::TestRequest::delete()
                .uri(&format!("/api/tasks/{}", Uuid::new_v4()))
                .to_request(),
        ] {
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[actix_rt::test]
    async fn test_create_task_validation() {
        let config = TokenConfig::new("secret", 1);
        let token = generate_token(1, &config).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(lazy_pool())
                .app_data(web::Data::new(config))
                .configure(|cfg| register(cfg, "/api/tasks")),
        )
        .await;

        for title in ["".to_string(), "   ".to_string(), "a".repeat(201)] {
            let req = test::TestRequest::post()
                .uri("/api/tasks")
                .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
                .set_json(json!({ "title": title }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }
}

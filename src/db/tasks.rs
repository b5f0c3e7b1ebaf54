use chrono::Utc;
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{Task, TaskInput, TaskQuery, TaskStatus};

const TASK_COLUMNS: &str =
    "id, user_id, title, description, priority, status, due_date, created_at, updated_at";

/// Lists a user's tasks, newest first, applying the optional filters.
pub async fn list_for_user<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i32,
    filter: &TaskQuery,
) -> Result<Vec<Task>, sqlx::Error> {
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM tasks WHERE user_id = ", TASK_COLUMNS));
    query.push_bind(user_id);

    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(priority) = filter.priority {
        query.push(" AND priority = ").push_bind(priority.as_str());
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        query
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    query.push(" ORDER BY created_at DESC");

    query.build_query_as::<Task>().fetch_all(executor).await
}

/// All of a user's tasks, oldest first. This is the order the chat assistant
/// numbers them in.
pub async fn list_in_creation_order<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i32,
) -> Result<Vec<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
        TASK_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(executor)
    .await
}

pub async fn insert<'e, E: PgExecutor<'e>>(executor: E, task: &Task) -> Result<Task, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "INSERT INTO tasks (id, user_id, title, description, priority, status, due_date, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(task.id)
    .bind(task.user_id)
    .bind(&task.title)
    .bind(&task.description)
    .bind(task.priority.as_str())
    .bind(task.status.as_str())
    .bind(task.due_date)
    .bind(task.created_at)
    .bind(task.updated_at)
    .fetch_one(executor)
    .await
}

/// Fetches a task only if it belongs to `user_id`.
pub async fn find_owned<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    user_id: i32,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2",
        TASK_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Replaces the editable fields of an owned task. `None` when no such task.
pub async fn replace<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    user_id: i32,
    input: &TaskInput,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks
         SET title = $1, description = $2, priority = $3, status = $4, due_date = $5, updated_at = $6
         WHERE id = $7 AND user_id = $8
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(input.title.trim())
    .bind(input.description.as_deref().filter(|d| !d.trim().is_empty()))
    .bind(input.priority.unwrap_or_default().as_str())
    .bind(input.status.unwrap_or_default().as_str())
    .bind(input.due_date)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn set_status<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    user_id: i32,
    status: TaskStatus,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET status = $1, updated_at = $2 WHERE id = $3 AND user_id = $4 RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(status.as_str())
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Flips `done` to `todo` and anything else to `done` in a single statement,
/// so concurrent toggles cannot both land on the same status.
pub async fn toggle_done<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    user_id: i32,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks
         SET status = CASE WHEN status = $1 THEN $2 ELSE $1 END, updated_at = $3
         WHERE id = $4 AND user_id = $5
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(TaskStatus::Done.as_str())
    .bind(TaskStatus::Todo.as_str())
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn rename<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    user_id: i32,
    title: &str,
) -> Result<Option<Task>, sqlx::Error> {
    sqlx::query_as::<_, Task>(&format!(
        "UPDATE tasks SET title = $1, updated_at = $2 WHERE id = $3 AND user_id = $4 RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(title)
    .bind(Utc::now())
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Returns `true` when a row was removed.
pub async fn delete_owned<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    user_id: i32,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Escapes `%`, `_` and `\` so user input matches literally inside ILIKE.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

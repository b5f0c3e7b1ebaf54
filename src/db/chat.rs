use chrono::Utc;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{ChatMessage, Conversation, MessageRole};

pub async fn create_conversation<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i32,
) -> Result<Conversation, sqlx::Error> {
    let now = Utc::now();
    sqlx::query_as::<_, Conversation>(
        "INSERT INTO conversations (id, user_id, created_at, updated_at)
         VALUES ($1, $2, $3, $3)
         RETURNING id, user_id, created_at, updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub async fn find_conversation<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
    user_id: i32,
) -> Result<Option<Conversation>, sqlx::Error> {
    sqlx::query_as::<_, Conversation>(
        "SELECT id, user_id, created_at, updated_at FROM conversations WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Most recently active first.
pub async fn list_conversations<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i32,
) -> Result<Vec<Conversation>, sqlx::Error> {
    sqlx::query_as::<_, Conversation>(
        "SELECT id, user_id, created_at, updated_at FROM conversations
         WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

pub async fn touch_conversation<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE conversations SET updated_at = $1 WHERE id = $2")
        .bind(Utc::now())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn append_message<'e, E: PgExecutor<'e>>(
    executor: E,
    conversation_id: Uuid,
    user_id: i32,
    role: MessageRole,
    content: &str,
) -> Result<ChatMessage, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(
        "INSERT INTO messages (id, conversation_id, user_id, role, content, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING id, conversation_id, user_id, role, content, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(conversation_id)
    .bind(user_id)
    .bind(role.as_str())
    .bind(content)
    .bind(Utc::now())
    .fetch_one(executor)
    .await
}

/// Oldest first, so the transcript reads top to bottom.
pub async fn list_messages<'e, E: PgExecutor<'e>>(
    executor: E,
    conversation_id: Uuid,
    user_id: i32,
) -> Result<Vec<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(
        "SELECT id, conversation_id, user_id, role, content, created_at FROM messages
         WHERE conversation_id = $1 AND user_id = $2
         ORDER BY created_at ASC",
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_all(executor)
    .await
}

//! Connection pool, schema creation and the query helpers shared by the
//! route modules.

pub mod chat;
pub mod tasks;

use futures::future::BoxFuture;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::error::BootstrapError;
use crate::startup::SchemaInitializer;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        email VARCHAR(255) NOT NULL UNIQUE,
        password_hash VARCHAR(255) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE TABLE IF NOT EXISTS tasks (
        id UUID PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title VARCHAR(200) NOT NULL,
        description TEXT,
        priority VARCHAR(20) NOT NULL DEFAULT 'medium',
        status VARCHAR(20) NOT NULL DEFAULT 'todo',
        due_date TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE INDEX IF NOT EXISTS idx_tasks_user_id ON tasks(user_id)",
    "CREATE TABLE IF NOT EXISTS conversations (
        id UUID PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE INDEX IF NOT EXISTS idx_conversations_user_id ON conversations(user_id)",
    "CREATE TABLE IF NOT EXISTS messages (
        id UUID PRIMARY KEY,
        conversation_id UUID NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        role VARCHAR(20) NOT NULL,
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )",
    "CREATE INDEX IF NOT EXISTS idx_messages_conversation_id ON messages(conversation_id)",
];

/// Creates the pool without opening a connection; the first query connects.
pub fn connect_lazy(database_url: &str) -> Result<PgPool, BootstrapError> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(database_url)
        .map_err(|e| BootstrapError::ConfigurationUnavailable(format!("invalid DATABASE_URL: {}", e)))
}

/// Creates every table and index that does not exist yet, in one transaction.
pub async fn create_db_and_tables(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    log::info!("database schema ready ({} statements)", SCHEMA.len());
    Ok(())
}

/// Postgres-backed schema initializer used by the startup hook.
#[derive(Clone)]
pub struct PgSchema {
    pool: PgPool,
}

impl PgSchema {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SchemaInitializer for PgSchema {
    fn initialize(&self) -> BoxFuture<'_, Result<(), sqlx::Error>> {
        Box::pin(create_db_and_tables(&self.pool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_are_idempotent() {
        for statement in SCHEMA {
            assert!(
                statement.contains("IF NOT EXISTS"),
                "statement is not idempotent: {}",
                statement
            );
        }
    }

    #[test]
    fn test_invalid_database_url_is_configuration_error() {
        assert!(matches!(
            connect_lazy("definitely not a url"),
            Err(BootstrapError::ConfigurationUnavailable(_))
        ));
    }
}

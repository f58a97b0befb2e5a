use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info, warn};

use crate::db::{StoreError, TodoStore};
use crate::models::{Completion, NewTodo, Todo, TodoUpdate};

const SCHEMA: &str = include_str!("schema.sql");

const IN_MEMORY_URLS: [&str; 3] = ["sqlite::memory:", "sqlite://:memory:", ":memory:"];

fn is_in_memory(database_url: &str) -> bool {
    IN_MEMORY_URLS.contains(&database_url.trim())
}

/// Row shape as SQLite hands it back, before the completed flag is checked.
#[derive(Debug, FromRow)]
struct TodoRow {
    id: i64,
    title: String,
    description: Option<String>,
    completed: i64,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<TodoRow> for Todo {
    type Error = StoreError;

    fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
        let completed = Completion::from_flag(row.completed).ok_or_else(|| StoreError::InvalidRow {
            id: row.id,
            reason: format!("completed flag {} is not 0 or 1", row.completed),
        })?;

        Ok(Todo {
            id: row.id,
            title: row.title,
            description: row.description,
            completed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Todo store backed by a single SQLite table.
///
/// Every operation is one statement run on a connection checked out of the
/// pool for that statement only, so it goes back to the pool on every exit path.
#[derive(Clone)]
pub struct SqliteTodoStore {
    pool: SqlitePool,
}

impl SqliteTodoStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        if is_in_memory(database_url) {
            if max_connections != 1 {
                warn!(
                    "in-memory database is pinned to one connection, ignoring max_connections={}",
                    max_connections
                );
            }
            return Self::in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        info!("connected to {}", database_url);
        Ok(Self { pool })
    }

    /// Private in-memory database. Pinned to one connection that never expires,
    /// since the data lives only as long as that connection.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self { pool })
    }

    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("database pool closed");
    }
}

#[async_trait]
impl TodoStore for SqliteTodoStore {
    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        let rows = sqlx::query_as::<_, TodoRow>(
            "SELECT id, title, description, completed, created_at, updated_at FROM todos",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Todo::try_from).collect()
    }

    async fn get(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        sqlx::query_as::<_, TodoRow>(
            "SELECT id, title, description, completed, created_at, updated_at FROM todos WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Todo::try_from)
        .transpose()
    }

    async fn create(&self, req: NewTodo) -> Result<Todo, StoreError> {
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            INSERT INTO todos (title, description)
            VALUES (?1, ?2)
            RETURNING id, title, description, completed, created_at, updated_at
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .fetch_one(&self.pool)
        .await?;

        info!("created todo {}", row.id);
        Todo::try_from(row)
    }

    async fn update(&self, id: i64, req: TodoUpdate) -> Result<Option<Todo>, StoreError> {
        // RETURNING yields no row when the id matched nothing, which keeps the
        // existence check inside the same statement as the write.
        let row = sqlx::query_as::<_, TodoRow>(
            r#"
            UPDATE todos
            SET title = ?1,
                description = ?2,
                completed = ?3,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?4
            RETURNING id, title, description, completed, created_at, updated_at
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.completed.as_flag())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                info!("updated todo {}", id);
                Todo::try_from(row).map(Some)
            }
            None => {
                debug!("update matched no todo {}", id);
                Ok(None)
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let affected = sqlx::query("DELETE FROM todos WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected > 0 {
            info!("deleted todo {}", id);
        }
        Ok(affected > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("select 1").execute(&self.pool).await?;
        Ok(())
    }
}

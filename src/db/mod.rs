pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewTodo, Todo, TodoUpdate};

pub use sqlite::SqliteTodoStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid row {id}: {reason}")]
    InvalidRow { id: i64, reason: String },
}

/// Durable storage for todos. The store assigns ids and timestamps.
///
/// Lookups by id return `None` (or `false` for deletes) when no row matched,
/// leaving the not-found decision to the caller.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Todo>, StoreError>;
    async fn get(&self, id: i64) -> Result<Option<Todo>, StoreError>;
    async fn create(&self, req: NewTodo) -> Result<Todo, StoreError>;
    async fn update(&self, id: i64, req: TodoUpdate) -> Result<Option<Todo>, StoreError>;
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
    async fn ping(&self) -> Result<(), StoreError>;
}

pub mod extract;

use axum::Json;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

use self::extract::{TodoId, ValidJson};

#[derive(Debug, Serialize)]
struct DeleteResponse {
    success: bool,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.store.ping().await?;
    Ok(StatusCode::OK)
}

async fn list_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, AppError> {
    let todos = state.store.list().await?;
    Ok(Json(todos))
}

async fn get_todo(
    State(state): State<AppState>,
    TodoId(id): TodoId,
) -> Result<Json<Todo>, AppError> {
    let todo = state.store.get(id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(todo))
}

async fn create_todo(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<NewTodo>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let todo = state.store.create(req).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(state): State<AppState>,
    TodoId(id): TodoId,
    ValidJson(req): ValidJson<TodoUpdate>,
) -> Result<Json<Todo>, AppError> {
    let todo = state
        .store
        .update(id, req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(todo))
}

async fn delete_todo(
    State(state): State<AppState>,
    TodoId(id): TodoId,
) -> Result<Json<DeleteResponse>, AppError> {
    if state.store.delete(id).await? {
        Ok(Json(DeleteResponse { success: true }))
    } else {
        Err(AppError::NotFound)
    }
}

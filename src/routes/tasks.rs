use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::repositories::{TaskFilters, TaskInput};
use crate::routes::non_empty;
use crate::server::AppState;

pub fn create_task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(handle_list_tasks).post(handle_create_task))
        .route("/tasks/completed", get(handle_completed_tasks))
        .route(
            "/tasks/{id}",
            get(handle_get_task)
                .put(handle_update_task)
                .delete(handle_delete_task),
        )
        .route("/tasks/{id}/status", patch(handle_update_status))
}

#[derive(Deserialize)]
struct TaskListParams {
    status: Option<String>,
    #[serde(alias = "prioridade")]
    priority: Option<String>,
    #[serde(alias = "categoria")]
    category: Option<String>,
    #[serde(alias = "palavra_chave")]
    keyword: Option<String>,
}

impl TaskListParams {
    fn into_filters(self) -> Option<TaskFilters> {
        let filters = TaskFilters {
            status: non_empty(self.status),
            priority: non_empty(self.priority),
            category: non_empty(self.category),
            keyword: non_empty(self.keyword),
        };
        let has_any = filters.status.is_some()
            || filters.priority.is_some()
            || filters.category.is_some()
            || filters.keyword.is_some();
        has_any.then_some(filters)
    }
}

async fn handle_list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskListParams>,
) -> Result<impl IntoResponse> {
    let tasks = state.task_service.list(params.into_filters()).await?;
    Ok(Json(json!({ "success": true, "data": tasks })))
}

async fn handle_get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let task = state.task_service.get(id).await?;
    Ok(Json(json!({ "success": true, "data": task })))
}

async fn handle_create_task(
    State(state): State<AppState>,
    Json(input): Json<TaskInput>,
) -> Result<impl IntoResponse> {
    let task = state.task_service.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": task })),
    ))
}

async fn handle_update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<TaskInput>,
) -> Result<impl IntoResponse> {
    let task = state.task_service.update(id, input).await?;
    Ok(Json(json!({ "success": true, "data": task })))
}

async fn handle_delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.task_service.delete(id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Task deleted successfully"
    })))
}

#[derive(Deserialize)]
struct StatusUpdateRequest {
    status: Option<String>,
}

async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<impl IntoResponse> {
    let status = body
        .status
        .ok_or_else(|| AppError::ValidationError(vec!["Status not provided".to_string()]))?;

    let task = state.task_service.update_status(id, &status).await?;
    Ok(Json(json!({ "success": true, "data": task })))
}

async fn handle_completed_tasks(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let tasks = state.task_service.completed().await?;
    Ok(Json(json!({ "success": true, "data": tasks })))
}

//! Task board endpoints
//!
//! Admin:
//! - GET /api/v1/tasks?status= - Every task, by status tab
//! - POST /api/v1/tasks - Assign a task
//! - DELETE /api/v1/tasks/{id}
//!
//! Any signed-in user (ownership checked by the service):
//! - GET /api/v1/tasks/mine?status=
//! - PUT /api/v1/tasks/{id}/status
//! - GET/POST /api/v1/tasks/{id}/comments

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{StatusQuery, SuccessResponse, TextRequest};
use crate::api::middleware::{ApiError, AppState, CurrentActor};
use crate::models::{CreateTaskInput, Message, Task, TaskStatus, TaskStatusFilter};

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tasks).post(add_task))
        .route("/{id}", delete(delete_task))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/mine", get(my_tasks))
        .route("/{id}/status", put(update_status))
        .route("/{id}/comments", get(list_comments).post(add_comment))
}

async fn list_tasks(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let filter = TaskStatusFilter::parse(query.status.as_deref())?;
    Ok(Json(state.task_service.list_tasks(&actor, filter).await?))
}

async fn my_tasks(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let filter = TaskStatusFilter::parse(query.status.as_deref())?;
    Ok(Json(state.task_service.my_tasks(&actor, filter).await?))
}

async fn add_task(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<CreateTaskInput>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = state.task_service.add_task(&actor, body).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn delete_task(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.task_service.delete_task(&actor, id).await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn update_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Task>, ApiError> {
    let task = state
        .task_service
        .update_task_status(&actor, id, body.status)
        .await?;
    Ok(Json(task))
}

async fn list_comments(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(state.task_service.list_task_comments(&actor, id).await?))
}

async fn add_comment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
    Json(body): Json<TextRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let message = state
        .task_service
        .add_task_comment(&actor, id, &body.text)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

//! Notification endpoints
//!
//! Admin:
//! - POST /api/v1/notifications
//! - POST /api/v1/notifications/urgent - "Urgent Review Alert" preset
//! - DELETE /api/v1/notifications/{id}
//!
//! Signed in:
//! - GET /api/v1/notifications - Everything posted
//! - GET /api/v1/notifications/visible - What the calling intern has not dismissed
//! - POST /api/v1/notifications/{id}/dismiss

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::SuccessResponse;
use crate::api::middleware::{ApiError, AppState, CurrentActor};
use crate::models::{CreateNotificationInput, Notification};

#[derive(Debug, Deserialize)]
pub struct UrgentRequest {
    pub message: String,
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", post(add_notification))
        .route("/urgent", post(broadcast_urgent))
        .route("/{id}", delete(delete_notification))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/visible", get(visible_notifications))
        .route("/{id}/dismiss", post(dismiss))
}

async fn add_notification(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<CreateNotificationInput>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let notification = state
        .notification_service
        .add_notification(&actor, body)
        .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

async fn broadcast_urgent(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<UrgentRequest>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    let notification = state
        .notification_service
        .broadcast_urgent(&actor, &body.message)
        .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

async fn delete_notification(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state
        .notification_service
        .delete_notification(&actor, id)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn list_notifications(
    State(state): State<AppState>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(state.notification_service.list_notifications().await?))
}

async fn visible_notifications(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<Notification>>, ApiError> {
    Ok(Json(
        state
            .notification_service
            .visible_notifications(&actor)
            .await?,
    ))
}

async fn dismiss(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.notification_service.dismiss(&actor, id).await?;
    Ok(Json(SuccessResponse::ok()))
}
